use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use stablepay_wallet_adapters::{BalancePoller, BalanceUpdate, CustodyServiceAdapter};
use stablepay_wallet_core::{
    Amount, CoinType, CreateOwnerAddressRequest, CustodyServicePort, MintRequest, PortError,
};

const TICK: Duration = Duration::from_millis(20);

fn funded_ledger(amount: u64) -> (Arc<CustodyServiceAdapter>, String) {
    let adapter = CustodyServiceAdapter::in_memory();
    let owner = adapter
        .create_owner_address(&CreateOwnerAddressRequest {
            user_name: "alice@example.com".to_owned(),
        })
        .expect("create");
    adapter
        .mint(&MintRequest {
            to_address: owner.address.clone(),
            amount: Amount::from(amount),
            user_name: "alice@example.com".to_owned(),
            coin_type: CoinType::Usdc,
        })
        .expect("mint");
    (Arc::new(adapter), owner.address)
}

fn wait_for_update(poller: &mut BalancePoller) -> BalanceUpdate {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(update) = poller.try_recv() {
            return update;
        }
        assert!(Instant::now() < deadline, "no balance update received");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn first_fetch_is_immediate_and_repeats() {
    let (service, address) = funded_ledger(42);
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let mut poller = BalancePoller::spawn(service, address.clone(), TICK, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .expect("spawn");
    assert_eq!(poller.address(), address);

    let first = wait_for_update(&mut poller);
    assert_eq!(first.address, address);
    assert_eq!(first.result, Ok(Amount::from(42)));
    wait_for_update(&mut poller);
    // notify runs after each send, so two notifications precede a third update.
    wait_for_update(&mut poller);
    assert!(notified.load(Ordering::SeqCst) >= 2);
    poller.shutdown();
}

#[test]
fn cancel_stops_further_updates() {
    let (service, address) = funded_ledger(1);
    let mut poller = BalancePoller::spawn(service, address, TICK, || {}).expect("spawn");
    wait_for_update(&mut poller);

    poller.cancel();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !poller.is_finished() {
        assert!(Instant::now() < deadline, "poller did not stop");
        thread::sleep(Duration::from_millis(5));
    }
    while poller.try_recv().is_some() {}

    thread::sleep(TICK * 4);
    assert!(poller.try_recv().is_none());
}

#[test]
fn failures_are_published_not_fatal() {
    let service = Arc::new(CustodyServiceAdapter::disabled("custody offline"));
    let mut poller = BalancePoller::spawn(service, "0xA", TICK, || {}).expect("spawn");

    let update = wait_for_update(&mut poller);
    assert_eq!(
        update.result,
        Err(PortError::Policy("custody offline".to_owned()))
    );
    let again = wait_for_update(&mut poller);
    assert!(again.result.is_err());
    poller.shutdown();
}

#[test]
fn dropping_the_poller_ends_the_thread() {
    let (service, address) = funded_ledger(5);
    let probe = Arc::clone(&service);
    let mut poller = BalancePoller::spawn(service, address, TICK, || {}).expect("spawn");
    wait_for_update(&mut poller);
    drop(poller);

    // The polling thread holds the only other handle to the service.
    let deadline = Instant::now() + Duration::from_secs(5);
    while Arc::strong_count(&probe) > 1 {
        assert!(Instant::now() < deadline, "poller kept the service alive");
        thread::sleep(Duration::from_millis(5));
    }
}
