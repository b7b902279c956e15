//! End-to-end feeder tests against an in-process fake engine.

use std::{sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use spool_engine::{EngineError, RetryDialer};
use spool_feeder::{
    Activation, FeedError, Feeder, InputSource, MemoryPolicyOracle, MemorySecretStore, OutputMode,
    SecretShare, Tag,
};
use spool_proto::ProtocolConfig;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::watch,
    task::JoinHandle,
};

fn protocol() -> Arc<ProtocolConfig> {
    Arc::new(ProtocolConfig {
        prime: "172035116406933162231178957667602464769".parse().unwrap(),
        r_inv: "116525037434575252203671714714489805504".parse().unwrap(),
        gf2n_bit_length: 40,
        gf2n_storage_size: 8,
        player_id: 1,
        player_count: 2,
        computation_timeout: Duration::from_secs(5),
        state_timeout: Duration::from_secs(60),
    })
}

/// Fake engine: consume the player header and one inbound frame, send the
/// given reply, close. Resolves to the inbound frame's payload.
async fn fake_engine(reply: Vec<u8>) -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let task = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();

        let mut player_header = [0u8; 5];
        sock.read_exact(&mut player_header).await.unwrap();
        assert_eq!(player_header, [0x01, 0x00, 0x00, 0x00, 0x31]);

        let len = sock.read_u32_le().await.unwrap();
        let mut payload = vec![0u8; len as usize];
        sock.read_exact(&mut payload).await.unwrap();

        sock.write_all(&reply).await.unwrap();
        payload
    });

    (port, task)
}

fn feeder(
    store: &MemorySecretStore,
    policy: &MemoryPolicyOracle,
    port: u16,
) -> Feeder {
    Feeder::new(
        protocol(),
        Arc::new(store.clone()),
        Arc::new(policy.clone()),
        Arc::new(RetryDialer::default()),
        "localhost",
        port,
    )
}

fn no_shutdown() -> watch::Receiver<bool> {
    watch::channel(false).1
}

fn stored_secret(id: &str, fill: u8, owner: &str) -> SecretShare {
    SecretShare {
        id: id.to_string(),
        data: BASE64.encode([fill; 32]),
        tags: vec![Tag::string("owner", owner), Tag::string("accessPolicy", "private")],
    }
}

#[tokio::test]
async fn stored_share_activation_persists_under_game_id() {
    // Engine result frame: chunk size 4, 64 payload bytes.
    let result_bytes: Vec<u8> = (0u8..64).collect();
    let mut reply = vec![0x04, 0x00, 0x00, 0x00];
    reply.extend_from_slice(&result_bytes);
    let (port, engine) = fake_engine(reply).await;

    let store = MemorySecretStore::new()
        .with_secret(stored_secret("s1", 1, "alice"))
        .with_secret(stored_secret("s2", 2, "bob"));
    let policy = MemoryPolicyOracle::allowing(vec![Tag {
        key: "creator".to_string(),
        value: "alice".to_string(),
        value_type: String::new(),
    }]);

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Stored(vec!["s1".to_string(), "s2".to_string()]),
        output: OutputMode::StoredShare,
    };

    let result =
        feeder(&store, &policy, port).feed(activation, no_shutdown()).await.unwrap();
    assert_eq!(result.to_json().unwrap(), r#"{"response":["abc"]}"#);

    // The engine saw both input shares, concatenated.
    let sent = engine.await.unwrap();
    assert_eq!(sent.len(), 64);
    assert_eq!(&sent[..32], &[1u8; 32]);
    assert_eq!(&sent[32..], &[2u8; 32]);

    // The result landed in the store under the game id, tagged.
    let created = store.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, "abc");
    assert_eq!(created[0].data, BASE64.encode(&result_bytes));
    assert_eq!(created[0].tags[0], Tag::string("gameID", "abc"));
    assert_eq!(created[0].tags[1], Tag::string("creator", "alice"));

    // The policy saw the resolved ownership metadata.
    let checks = policy.checks();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].subject, "sum");
    assert_eq!(checks[0].player_count, 2);
    assert_eq!(checks[0].inputs[0].owner, "alice");
    assert_eq!(checks[0].inputs[1].owner, "bob");
}

#[tokio::test]
async fn denied_policy_aborts_before_the_engine() {
    let store = MemorySecretStore::new().with_secret(stored_secret("s1", 1, "alice"));
    let policy = MemoryPolicyOracle::denying();

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Stored(vec!["s1".to_string()]),
        output: OutputMode::SecretShare,
    };

    // Port 1 is unbound: reaching the engine would fail loudly.
    let err = feeder(&store, &policy, 1).feed(activation, no_shutdown()).await.unwrap_err();
    assert!(matches!(err, FeedError::Unauthorized(_)));
}

#[tokio::test]
async fn erroring_policy_is_unauthorized() {
    let store = MemorySecretStore::new().with_secret(stored_secret("s1", 1, "alice"));
    let policy = MemoryPolicyOracle::failing("oracle down");

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Stored(vec!["s1".to_string()]),
        output: OutputMode::SecretShare,
    };

    let err = feeder(&store, &policy, 1).feed(activation, no_shutdown()).await.unwrap_err();
    assert!(matches!(err, FeedError::Unauthorized(_)));
}

#[tokio::test]
async fn inline_plaintext_activation_opens_the_result() {
    // One opened field element in Montgomery form; decodes to "111".
    let mut reply = vec![0x10, 0x00, 0x00, 0x00];
    reply.extend_from_slice(&hex::decode("25ff2e29a2e537d32195075a4cf3f547").unwrap());
    let (port, engine) = fake_engine(reply).await;

    let store = MemorySecretStore::new();
    let policy = MemoryPolicyOracle::denying();

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Inline(vec![BASE64.encode([7u8; 32])]),
        output: OutputMode::Plaintext,
    };

    let result =
        feeder(&store, &policy, port).feed(activation, no_shutdown()).await.unwrap();
    assert_eq!(result.response, vec!["MTEx".to_string()]);

    // Inline mode never consults the policy oracle.
    assert!(policy.checks().is_empty());

    engine.await.unwrap();
}

#[tokio::test]
async fn secret_share_mode_returns_one_blob_per_chunk() {
    let mut reply = vec![0x20, 0x00, 0x00, 0x00];
    reply.extend_from_slice(&[5u8; 32]);
    reply.extend_from_slice(&[6u8; 32]);
    let (port, _engine) = fake_engine(reply).await;

    let store = MemorySecretStore::new();
    let policy = MemoryPolicyOracle::allowing(Vec::new());

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Inline(vec![BASE64.encode([7u8; 32])]),
        output: OutputMode::SecretShare,
    };

    let result =
        feeder(&store, &policy, port).feed(activation, no_shutdown()).await.unwrap();
    assert_eq!(result.response, vec![BASE64.encode([5u8; 32]), BASE64.encode([6u8; 32])]);
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn engine_silence_is_an_empty_response() {
    let (port, _engine) = fake_engine(Vec::new()).await;

    let store = MemorySecretStore::new();
    let policy = MemoryPolicyOracle::allowing(Vec::new());

    let activation = Activation {
        game_id: "abc".to_string(),
        program: "sum".to_string(),
        input: InputSource::Inline(vec![BASE64.encode([7u8; 32])]),
        output: OutputMode::SecretShare,
    };

    let err = feeder(&store, &policy, port).feed(activation, no_shutdown()).await.unwrap_err();
    assert!(matches!(err, FeedError::Engine(EngineError::EmptyResponse)));
}
