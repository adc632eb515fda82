//! In-memory switch fleet shared by the integration tests.
//!
//! Each fake switch answers `show vlan brief` / `show vlan id N` from its own
//! VLAN table and applies `vlan N` / `name X` configuration to it.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use vlansync::config::{DeviceTarget, Inventory};
use vlansync::device::{Credentials, DeviceSession, SessionConnector};
use vlansync::error::SessionError;

/// How a fake switch misbehaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    /// Behaves.
    #[default]
    None,
    /// Refuses the connection.
    Unreachable,
    /// Rejects every configuration line.
    RejectConfig,
    /// Never answers a command.
    Stall,
    /// Accepts configuration but does not change its table.
    IgnoreConfig,
    /// Prints something that is not a VLAN table.
    Garbage,
    /// Drops the session on the verification read.
    DropOnVerify,
}

/// One fake switch.
#[derive(Default)]
pub struct FakeSwitch {
    pub vlans: Mutex<BTreeMap<u16, String>>,
    pub fault: Fault,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub configured: Mutex<Vec<Vec<String>>>,
    /// Cancelled once this switch has been connected to.
    pub cancel_on_connect: Option<CancellationToken>,
    /// Delay before each command answer.
    pub latency: Duration,
    /// Interfaces listed by `show ip interface brief`.
    pub ports: Vec<String>,
    pub descriptions: Mutex<BTreeMap<String, String>>,
}

impl FakeSwitch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_vlan(id: u16, name: &str) -> Self {
        let switch = Self::default();
        switch.vlans.lock().unwrap().insert(id, name.to_string());
        switch
    }

    pub fn faulty(fault: Fault) -> Self {
        Self {
            fault,
            ..Self::default()
        }
    }

    pub fn with_ports(ports: &[&str]) -> Self {
        Self {
            ports: ports.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn description(&self, interface: &str) -> Option<String> {
        self.descriptions.lock().unwrap().get(interface).cloned()
    }

    pub fn vlan(&self, id: u16) -> Option<String> {
        self.vlans.lock().unwrap().get(&id).cloned()
    }

    pub fn configured(&self) -> Vec<Vec<String>> {
        self.configured.lock().unwrap().clone()
    }

    fn interface_brief(&self) -> String {
        let mut out = String::from(
            "Interface              IP-Address      OK? Method Status                Protocol\n",
        );
        for port in &self.ports {
            out.push_str(&format!(
                "{port:<22} unassigned      YES unset  administratively down down\n"
            ));
        }
        out
    }

    fn table(&self) -> String {
        let mut out = String::from("VLAN Name                             Status    Ports\n");
        out.push_str("---- -------------------------------- --------- -------------------------------\n");
        out.push_str(&format!("{:<4} {:<32} active    Gi0/1, Gi0/2\n", 1, "default"));
        for (id, name) in self.vlans.lock().unwrap().iter() {
            out.push_str(&format!("{id:<4} {name:<32} active\n"));
        }
        out
    }
}

/// A fleet of named fake switches.
#[derive(Default)]
pub struct FakeFleet {
    switches: BTreeMap<String, Arc<FakeSwitch>>,
    order: Arc<Mutex<Vec<String>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, switch: FakeSwitch) -> Arc<FakeSwitch> {
        let switch = Arc::new(switch);
        self.switches.insert(name.to_string(), Arc::clone(&switch));
        switch
    }

    /// Device names in the order they were connected to.
    pub fn connection_order(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.order)
    }

    /// Highest number of sessions open at once.
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl SessionConnector for FakeFleet {
    async fn connect(
        &self,
        target: &DeviceTarget,
        _credentials: &Credentials,
    ) -> Result<Box<dyn DeviceSession>, SessionError> {
        let switch = Arc::clone(&self.switches[&target.name]);
        switch.connects.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push(target.name.clone());

        if switch.fault == Fault::Unreachable {
            return Err(SessionError::Unreachable {
                address: target.address.clone(),
                message: String::from("connection refused"),
            });
        }
        if let Some(token) = &switch.cancel_on_connect {
            token.cancel();
        }

        let open = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            switch,
            active: Arc::clone(&self.active),
        }))
    }
}

struct FakeSession {
    switch: Arc<FakeSwitch>,
    active: Arc<AtomicUsize>,
}

impl FakeSession {
    async fn pause(&self) {
        if self.switch.fault == Fault::Stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if !self.switch.latency.is_zero() {
            tokio::time::sleep(self.switch.latency).await;
        }
    }
}

#[async_trait]
impl DeviceSession for FakeSession {
    async fn elevate(&mut self, _secret: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        self.pause().await;
        if self.switch.fault == Fault::Garbage {
            return Ok(String::from("%% something went sideways"));
        }
        if command == "show ip interface brief" {
            return Ok(self.switch.interface_brief());
        }
        if let Some(id) = command.strip_prefix("show vlan id ") {
            if self.switch.fault == Fault::DropOnVerify {
                return Err(SessionError::disconnected("connection reset by peer"));
            }
            let id: u16 = id.trim().parse().unwrap();
            return Ok(match self.switch.vlan(id) {
                Some(name) => format!(
                    "VLAN Name                             Status    Ports\n---- -------------------------------- --------- -----\n{id:<4} {name:<32} active\n"
                ),
                None => format!("VLAN id {id} not found in current VLAN database\n"),
            });
        }
        Ok(self.switch.table())
    }

    async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError> {
        self.pause().await;
        self.switch.configured.lock().unwrap().push(commands.to_vec());

        match self.switch.fault {
            Fault::RejectConfig => {
                return Err(SessionError::CommandRejected {
                    command: commands[0].clone(),
                    output: String::from("% Invalid input detected at '^' marker."),
                });
            }
            Fault::IgnoreConfig => return Ok(String::new()),
            _ => {}
        }

        if let Some(interface) = commands[0].strip_prefix("interface ") {
            let description = commands[1].trim_start_matches("description ").to_string();
            self.switch
                .descriptions
                .lock()
                .unwrap()
                .insert(interface.to_string(), description);
            return Ok(String::new());
        }

        let id: u16 = commands[0].trim_start_matches("vlan ").parse().unwrap();
        let name = commands[1].trim_start_matches("name ").to_string();
        self.switch.vlans.lock().unwrap().insert(id, name);
        Ok(String::new())
    }

    async fn disconnect(&mut self) {
        self.switch.disconnects.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("admin", "cisco", "class")
}

pub fn inventory(names: &[&str]) -> Inventory {
    Inventory::from_devices(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| DeviceTarget::new(*name, format!("10.0.0.{}", i + 1)))
            .collect(),
    )
    .unwrap()
}
