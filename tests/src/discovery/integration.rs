use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use plum_core::discovery::DiscoveryQuery;
use plum_protocols::discovery;

use crate::support::{DEVICE_MAC, DevicePort, engine_socket, loopback_context};

/// Answers every LOOK with the INFO returned by `answer(look_number)`.
fn spawn_agent(agent: DevicePort, answer: fn(usize) -> Vec<u8>) -> Arc<AtomicUsize> {
    let looks = Arc::new(AtomicUsize::new(0));
    let counter = looks.clone();
    tokio::spawn(async move {
        loop {
            let (query, from) = agent.recv().await;
            assert_eq!(query, discovery::create_query());
            let number = counter.fetch_add(1, Ordering::SeqCst) + 1;
            agent.send(&answer(number), from).await;
        }
    });
    looks
}

#[tokio::test]
async fn ten_foreign_answers_mean_not_found() {
    let agent = DevicePort::bind().await;
    let ctx = loopback_context(0, 0, agent.port);
    let looks = spawn_agent(agent, |_| {
        discovery::create_info([("MAC", "00:d0:4b:00:00:01"), ("ADDR", "192.168.1.50")])
    });

    let found = DiscoveryQuery::new(engine_socket().await, &ctx)
        .find_ip_by_mac(DEVICE_MAC, Ipv4Addr::new(192, 168, 1, 77))
        .await
        .unwrap();

    assert_eq!(found, None);
    assert_eq!(looks.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn device_is_found_once_it_is_back() {
    let agent = DevicePort::bind().await;
    let ctx = loopback_context(0, 0, agent.port);
    let looks = spawn_agent(agent, |number| {
        if number < 3 {
            discovery::create_info([("MAC", "00:D0:4B:8C:11:22"), ("ADDR", "192.168.1.77")])
        } else {
            discovery::create_info([("NAME", "nas"), ("MAC", "00:D0:4B:8C:11:22"), ("ADDR", "192.168.1.123")])
        }
    });

    let found = DiscoveryQuery::new(engine_socket().await, &ctx)
        .find_ip_by_mac(DEVICE_MAC, Ipv4Addr::new(192, 168, 1, 77))
        .await
        .unwrap();

    assert_eq!(found, Some(Ipv4Addr::new(192, 168, 1, 123)));
    assert_eq!(looks.load(Ordering::SeqCst), 3);
}
