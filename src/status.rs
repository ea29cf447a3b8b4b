//! Live instance status over HTTP and TCP.
//!
//! Values are passed through as the cluster reports them; normalising them
//! for display is the caller's business.

use log::debug;
use serde::Deserialize;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use topology::{Instance, Role, StatusProbe};

pub const UP: &str = "Up";
pub const DOWN: &str = "Down";
pub const UNKNOWN: &str = "N/A";

/// Marks the coordinator currently holding leadership
const LEADER_SUFFIX: &str = "|L";

#[derive(Debug, Deserialize)]
struct Leader {
    #[serde(default)]
    client_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Stores {
    #[serde(default)]
    stores: Vec<StoreEntry>,
}

#[derive(Debug, Deserialize)]
struct StoreEntry {
    store: Store,
}

#[derive(Debug, Deserialize)]
struct Store {
    address: String,
    state_name: String,
}

/// Probes instances with short timeouts.
///
/// Coordinators answer `/health` (and `/leader` to spot the leader),
/// storage state comes from a coordinator's `/stores`, everything else is
/// a TCP connect to the main port.
pub struct HttpProbe {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, timeout }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Option<T> {
        match self.agent.get(url).call() {
            Ok(mut response) => response.body_mut().read_json().ok(),
            Err(e) => {
                debug!("GET {url}: {e}");
                None
            }
        }
    }

    fn coordinator(&self, instance: &Instance, endpoints: &[String]) -> String {
        let url = format!("http://{}:{}", instance.host(), instance.main_port());
        if self.agent.get(&format!("{url}/health")).call().is_err() {
            return DOWN.to_string();
        }

        let is_leader = endpoints.iter().find_map(|endpoint| {
            self.get_json::<Leader>(&format!("{endpoint}/leader"))
                .map(|leader| leader.client_urls.contains(&url))
        });
        if is_leader == Some(true) {
            format!("{UP}{LEADER_SUFFIX}")
        } else {
            UP.to_string()
        }
    }

    fn storage(&self, instance: &Instance, endpoints: &[String]) -> String {
        endpoints
            .iter()
            .find_map(|endpoint| self.get_json::<Stores>(&format!("{endpoint}/stores")))
            .and_then(|stores| store_state(&stores, &instance.id()))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn port_open(&self, instance: &Instance) -> String {
        let open = (instance.host(), instance.main_port())
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .is_some_and(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok());
        let status = if open { UP } else { DOWN };
        status.to_string()
    }
}

fn store_state(stores: &Stores, id: &str) -> Option<String> {
    stores
        .stores
        .iter()
        .find(|entry| entry.store.address == id)
        .map(|entry| entry.store.state_name.clone())
}

impl StatusProbe for HttpProbe {
    fn probe(&self, instance: &Instance, endpoints: &[String]) -> String {
        match instance.role() {
            Role::Coordinator => self.coordinator(instance, endpoints),
            Role::Storage => self.storage(instance, endpoints),
            _ => self.port_open(instance),
        }
    }
}
