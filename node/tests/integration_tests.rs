//! Integration tests exercising the full node:
//! genesis → LMDB persistence → ledger rebuild → voters query → HTTP.

use std::path::Path;

use dpos_node::{NodeConfig, ShutdownController, VotersNode};
use dpos_rpc::{VotersOutcome, VotersParams, VotersResponse};
use dpos_store::{Account, AccountStore, VoteEdgeStore};
use dpos_types::{Address, Balance, PublicKey, Username};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DELEGATE_KEY: &str = "c094ebee7ec0c50ebee32918655e089f6e1a604b83bcaa760293c61e0f18ab6f";

fn voter_key(seed: u8) -> PublicKey {
    PublicKey::new([seed; 32])
}

fn write_genesis(dir: &Path) -> std::path::PathBuf {
    let voters: Vec<String> = (1u8..=3)
        .map(|seed| {
            format!(
                r#"{{ "publicKey": "{}", "balance": "{}" }}"#,
                voter_key(seed).to_hex(),
                seed as u64 * 1_000
            )
        })
        .collect();
    let votes: Vec<String> = (1u8..=3)
        .map(|seed| {
            format!(
                r#"{{ "voter": "{}", "votes": ["+{DELEGATE_KEY}"] }}"#,
                Address::from_public_key(&voter_key(seed))
            )
        })
        .collect();
    let json = format!(
        r#"{{
            "accounts": [
                {{ "publicKey": "{DELEGATE_KEY}", "username": "genesis_1", "balance": "0" }},
                {}
            ],
            "votes": [{}]
        }}"#,
        voters.join(","),
        votes.join(",")
    );
    let path = dir.join("genesis.json");
    std::fs::write(&path, json).expect("write genesis");
    path
}

fn config(dir: &Path) -> NodeConfig {
    NodeConfig {
        data_dir: dir.join("data"),
        rpc_port: 0,
        lmdb_map_size: 64 * 1024 * 1024,
        genesis_file: Some(write_genesis(dir)),
        ..Default::default()
    }
}

fn query_username(node: &VotersNode<impl AccountStore + VoteEdgeStore + Send + Sync + 'static>, name: &str) -> VotersResponse {
    let params = VotersParams {
        username: Some(name.into()),
        ..Default::default()
    };
    match node.service().query(&params).expect("query") {
        VotersOutcome::Found(response) => response,
        VotersOutcome::NotFound => panic!("{name} not found"),
    }
}

// ---------------------------------------------------------------------------
// 1. Genesis import
// ---------------------------------------------------------------------------

#[test]
fn genesis_is_imported_into_empty_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let node = VotersNode::open(config(dir.path())).expect("open node");

    assert_eq!(node.store().account_count().unwrap(), 4);
    assert_eq!(node.store().edge_count().unwrap(), 3);

    let response = query_username(&node, "genesis_1");
    assert_eq!(response.votes, 3);
    assert_eq!(response.voters.len(), 3);
    assert_eq!(response.public_key.unwrap().to_hex(), DELEGATE_KEY);
}

// ---------------------------------------------------------------------------
// 2. Restart replays the edge log
// ---------------------------------------------------------------------------

#[test]
fn restart_rebuilds_ledger_without_reapplying_genesis() {
    let dir = tempfile::tempdir().expect("temp dir");
    let delegate = PublicKey::from_hex(DELEGATE_KEY).unwrap();
    let leaving = Address::from_public_key(&voter_key(1));

    {
        let node = VotersNode::open(config(dir.path())).expect("open node");
        node.apply_vote_transaction(&leaving, &[format!("-{DELEGATE_KEY}")], 100)
            .expect("unvote");
        node.put_account(
            &Account::from_public_key(voter_key(9), Balance::new(1))
                .with_username(Username::new("newcomer").unwrap()),
        )
        .expect("register");
    }

    let node = VotersNode::open(config(dir.path())).expect("reopen node");
    assert_eq!(node.store().account_count().unwrap(), 5);
    assert_eq!(node.store().edge_count().unwrap(), 4);

    let voters = node.ledger().voters_of(&delegate);
    assert_eq!(voters.len(), 2);
    assert!(!voters.contains(&leaving));

    let response = query_username(&node, "GENESIS_1");
    assert_eq!(response.votes, 2);

    let newcomer = query_username(&node, "newcomer");
    assert_eq!(newcomer.votes, 0);
    assert!(newcomer.voters.is_empty());
}

// ---------------------------------------------------------------------------
// 3. Live and restarted ledgers agree
// ---------------------------------------------------------------------------

#[test]
fn conflicting_edges_survive_restart_unchanged() {
    let dir = tempfile::tempdir().expect("temp dir");
    let delegate = PublicKey::from_hex(DELEGATE_KEY).unwrap();
    let voter = Address::from_u64(7);

    let live = {
        let node = VotersNode::open(config(dir.path())).expect("open node");
        node.apply_vote_transaction(&voter, &[format!("+{DELEGATE_KEY}")], 50)
            .expect("vote");
        node.apply_vote_transaction(&voter, &[format!("-{DELEGATE_KEY}")], 50)
            .expect("conflicting vote");
        node.ledger().voters_of(&delegate)
    };
    assert!(live.contains(&voter));

    let node = VotersNode::open(config(dir.path())).expect("reopen node");
    assert_eq!(*node.ledger().voters_of(&delegate), *live);
}

#[test]
fn genesis_vote_naming_a_delegate_twice_is_refused() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("duplicate_genesis.json");
    std::fs::write(
        &path,
        format!(r#"{{"votes":[{{"voter":"7L","votes":["+{DELEGATE_KEY}","-{DELEGATE_KEY}"]}}]}}"#),
    )
    .expect("write genesis");
    let config = NodeConfig {
        genesis_file: Some(path),
        ..config(dir.path())
    };

    assert!(VotersNode::open(config.clone()).is_err());
    // Nothing was written, so a fixed genesis can still be applied.
    let store = dpos_store_lmdb::LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)
        .expect("reopen env")
        .store();
    assert_eq!(store.edge_count().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// 4. HTTP surface
// ---------------------------------------------------------------------------

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    response
}

#[tokio::test]
async fn serves_voters_over_http_until_shutdown() {
    let dir = tempfile::tempdir().expect("temp dir");
    let node = VotersNode::open(config(dir.path())).expect("open node");

    let server = node.bind_rpc().await.expect("bind");
    let addr = server.local_addr().expect("addr");
    let shutdown = ShutdownController::new();
    let handle = tokio::spawn(server.serve(shutdown.signalled()));

    let ok = http_get(addr, "/api/voters?username=genesis_1&limit=2").await;
    assert!(ok.starts_with("HTTP/1.1 200"), "{ok}");
    assert!(ok.contains("\"votes\":3"), "{ok}");

    let missing = http_get(addr, "/api/voters?username=nobody").await;
    assert!(missing.contains("No data returned"), "{missing}");

    let bad = http_get(addr, "/api/voters").await;
    assert!(bad.starts_with("HTTP/1.1 400"), "{bad}");

    let metrics = http_get(addr, "/metrics").await;
    assert!(metrics.contains("dpos_voters_queries_total 3"), "{metrics}");

    shutdown.shutdown();
    handle.await.expect("join").expect("serve");
}
