//! Interface audit and description updates across the fleet.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{credentials, inventory, FakeFleet, FakeSwitch, Fault};
use vlansync::config::SessionSettings;
use vlansync::error::ErrorKind;
use vlansync::interfaces::{DescriptionChange, InterfaceAudit};

fn audit(fleet: FakeFleet) -> InterfaceAudit {
    InterfaceAudit::new(Arc::new(fleet), credentials(), &SessionSettings::default())
}

#[tokio::test]
async fn lists_interfaces_without_changing_anything() {
    let mut fleet = FakeFleet::new();
    let sw1 = fleet.add("sw1", FakeSwitch::with_ports(&["GigabitEthernet0/1", "Vlan10"]));

    let report = audit(fleet).run(&inventory(&["sw1"]), None).await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.interfaces.len(), 2);
    assert_eq!(outcome.interfaces[0].interface, "GigabitEthernet0/1");
    assert_eq!(outcome.interfaces[0].status, "administratively down");
    assert!(!outcome.applied && !outcome.skipped);
    assert!(sw1.configured().is_empty());
    assert_eq!(sw1.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn description_applies_only_where_interface_exists() {
    let mut fleet = FakeFleet::new();
    let sw1 = fleet.add("sw1", FakeSwitch::with_ports(&["GigabitEthernet0/1"]));
    let sw2 = fleet.add("sw2", FakeSwitch::with_ports(&["FastEthernet0/1"]));
    fleet.add("sw3", FakeSwitch::faulty(Fault::Unreachable));

    let change = DescriptionChange::new("GigabitEthernet0/1", "uplink to core").unwrap();
    let report = audit(fleet)
        .run(&inventory(&["sw1", "sw2", "sw3"]), Some(change))
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].applied);
    assert_eq!(sw1.description("GigabitEthernet0/1").as_deref(), Some("uplink to core"));

    assert!(report.outcomes[1].skipped);
    assert!(sw2.configured().is_empty());

    let failure = report.outcomes[2].failure.as_ref().unwrap();
    assert_eq!(failure.kind, ErrorKind::Connection);
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn empty_description_is_rejected() {
    assert!(DescriptionChange::new("Gi0/1", "  ").is_err());
    assert!(DescriptionChange::new("", "uplink").is_err());
}
