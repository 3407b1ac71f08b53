use std::cell::RefCell;
use std::rc::Rc;

use events_cc::store::Read;
use events_cc::{Block, BlockEvent, Error, EventSender, Peer, PeerConfig, TxEvent};

fn setup() -> (Peer<EventSender>, Rc<RefCell<Vec<BlockEvent>>>) {
    let mut peer: Peer<EventSender> = Peer::new(PeerConfig::default(), EventSender);
    let res = peer.instantiate(["init"]).unwrap();
    assert!(res.is_committed());
    assert!(res.event.is_none());

    let seen = Rc::new(RefCell::new(vec![]));
    let sink = seen.clone();
    peer.events()
        .register_chaincode_event("events_cc", "^evtsender", move |event| {
            sink.borrow_mut().push(event.clone())
        })
        .unwrap();
    (peer, seen)
}

fn count(peer: &mut Peer<EventSender>) -> Vec<u8> {
    let res = peer.query(["invoke", "query"]).unwrap();
    assert!(res.is_ok());
    res.payload
}

#[test]
fn invocations_emit_numbered_events() {
    let (mut peer, seen) = setup();
    assert_eq!(count(&mut peer), b"0");

    for suffix in ["a", "b", "c"] {
        let res = peer.invoke(["invoke", "invoke", suffix]).unwrap();
        assert!(res.is_committed());
        assert!(res.response.payload.is_empty());
    }
    assert_eq!(count(&mut peer), b"3");

    let seen = seen.borrow();
    let payloads: Vec<_> = seen
        .iter()
        .map(|e| String::from_utf8(e.event.payload.clone()).unwrap())
        .collect();
    assert_eq!(payloads, vec!["Event 0a", "Event 1b", "Event 2c"]);
    assert!(seen.iter().all(|e| e.event.event_name == "evtsenderinvoke"));
    assert!(seen.iter().all(|e| e.event.chaincode_id == "events_cc"));

    let blocks: Vec<_> = seen.iter().map(|e| e.block_number).collect();
    assert_eq!(blocks, vec![1, 2, 3]);
}

#[test]
fn event_carries_committing_tx() {
    let (mut peer, seen) = setup();
    let res = peer.invoke(["invoke", "invoke", "-x"]).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event.tx_id, res.tx_id);
    assert_eq!(Some(&seen[0].event), res.event.as_ref());
}

#[test]
fn clear_resets_counter() {
    let (mut peer, seen) = setup();
    peer.invoke(["invoke", "invoke", ""]).unwrap();
    peer.invoke(["invoke", "invoke", ""]).unwrap();

    let res = peer.invoke(["invoke", "clear"]).unwrap();
    assert!(res.is_committed());
    assert!(res.event.is_none());
    assert_eq!(count(&mut peer), b"0");

    peer.invoke(["invoke", "invoke", "!"]).unwrap();
    let last = seen.borrow().last().cloned().unwrap();
    assert_eq!(last.event.payload, b"Event 0!");
}

#[test]
fn query_does_not_commit() {
    let (mut peer, seen) = setup();
    let height = peer.height();

    // a query running the invoke handler still gets thrown away
    let res = peer.query(["invoke", "invoke", "q"]).unwrap();
    assert!(res.is_ok());
    assert_eq!(peer.height(), height);
    assert!(seen.borrow().is_empty());
    assert_eq!(count(&mut peer), b"0");
}

#[test]
fn rejected_invocations() {
    let (mut peer, seen) = setup();
    let height = peer.height();

    let cases: [&[&str]; 4] = [
        &["query"],
        &["invoke", "bogus"],
        &["invoke", "invoke"],
        &["invoke", "invoke", "a", "b"],
    ];
    for args in cases {
        let res = peer.invoke(args.iter().copied()).unwrap();
        assert!(!res.is_committed(), "{:?} should be rejected", args);
        assert_eq!(res.response.status, 500);
    }

    assert_eq!(peer.height(), height);
    assert!(seen.borrow().is_empty());
    assert_eq!(peer.state().get(b"numEvents").unwrap(), Some(b"0".to_vec()));
}

#[test]
fn listener_filters_other_chaincodes() {
    let config = PeerConfig::new().chaincode_id("renamed_cc");
    let mut peer: Peer<EventSender> = Peer::new(config, EventSender);
    peer.instantiate(["init"]).unwrap();

    let seen = Rc::new(RefCell::new(0));
    let sink = seen.clone();
    peer.events()
        .register_chaincode_event("events_cc", ".*", move |_| *sink.borrow_mut() += 1)
        .unwrap();

    let res = peer.invoke(["invoke", "invoke", "z"]).unwrap();
    assert_eq!(res.event.unwrap().chaincode_id, "renamed_cc");
    assert_eq!(*seen.borrow(), 0);
}

#[test]
fn must_instantiate_first() {
    let mut peer: Peer<EventSender> = Peer::new(PeerConfig::default(), EventSender);
    assert!(matches!(
        peer.invoke(["invoke", "invoke", "a"]),
        Err(Error::NotInstantiated)
    ));
}

#[test]
fn ledger_queries() {
    let (mut peer, _) = setup();
    let committed = peer.invoke(["invoke", "invoke", "a"]).unwrap();
    let rejected = peer.invoke(["invoke", "bogus"]).unwrap();
    peer.query(["invoke", "query"]).unwrap();

    assert_eq!(peer.height(), 2);
    let block = peer.block_by_tx_id(&committed.tx_id).unwrap();
    assert_eq!(block.number, 1);
    assert_eq!(block.events().next(), committed.event.as_ref());

    let tx = peer.transaction(&committed.tx_id).unwrap();
    assert_eq!(tx.args, vec!["invoke", "invoke", "a"]);
    assert_eq!(tx.event.as_ref().unwrap().payload, b"Event 0a");

    let genesis = peer.block(0).unwrap();
    assert_eq!(genesis.transactions[0].args, vec!["init"]);
    assert!(genesis.events().next().is_none());

    assert!(peer.block(2).is_none());
    assert!(peer.block_by_tx_id(&rejected.tx_id).is_none());
    assert!(peer.transaction(&rejected.tx_id).is_none());
    assert!(peer.transaction("unknown").is_none());

    let info = peer.info();
    assert_eq!(info.height, 2);
    assert_eq!(info.current_block_hash, peer.block(1).unwrap().hash);
    assert_eq!(info.previous_block_hash, peer.block(0).unwrap().hash);
}

#[test]
fn tx_and_block_listeners() {
    let (mut peer, _) = setup();

    let blocks: Rc<RefCell<Vec<Block>>> = Rc::new(RefCell::new(vec![]));
    let sink = blocks.clone();
    peer.events()
        .register_block_event(move |block| sink.borrow_mut().push(block.clone()));

    let first = peer.invoke(["invoke", "invoke", "a"]).unwrap();
    peer.invoke(["invoke", "clear"]).unwrap();
    assert_eq!(blocks.borrow().len(), 2);
    assert_eq!(blocks.borrow()[0].transactions[0].tx_id, first.tx_id);

    // tx ids are only known after submission, so a listener for an already
    // committed tx never fires
    let txs: Rc<RefCell<Vec<TxEvent>>> = Rc::new(RefCell::new(vec![]));
    let sink = txs.clone();
    peer.events()
        .register_tx_event(&first.tx_id, move |event| sink.borrow_mut().push(event.clone()));
    peer.invoke(["invoke", "invoke", "b"]).unwrap();
    assert!(txs.borrow().is_empty());
    assert_eq!(peer.events().listener_count(), 3);
}
