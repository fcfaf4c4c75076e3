//! Walks a key through both phases of resolution, then clears the
//! application with the credentials the service delivered.
//!
//! Run with: cargo run --example basic_agent

use keyagent::crypto::{Envelope, EnvelopeCipher};
use keyagent::error::Result;
use keyagent::prelude::*;

/// Stand-in for the real envelope cipher: XOR under a one-byte key.
struct DemoCipher(u8);

impl EnvelopeCipher for DemoCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Envelope> {
        Ok(Envelope {
            wrapped_key: vec![self.0],
            ciphertext: plaintext.iter().map(|b| b ^ self.0).collect(),
        })
    }

    fn open(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        Ok(envelope.ciphertext.iter().map(|b| b ^ self.0).collect())
    }
}

/// Plays the key-control service: answers every command it receives.
fn serve(request: &Envelope, cipher: &DemoCipher) -> Result<Envelope> {
    let command = JsonCodec.decode_command(&cipher.open(request)?)?;
    let outcome = match command.kind {
        OperationKind::Search | OperationKind::Generate => ReplyOutcome::Key {
            value: KeyValue::from_slice(b"0123456789abcdef0123456789abcdef")?,
        },
        OperationKind::SaveInfo => ReplyOutcome::Info {
            info: AccountInfo {
                account: "demo-ta".into(),
                password: "demo-password".into(),
            },
        },
        _ => ReplyOutcome::Done,
    };
    let reply = ReplyNode {
        application_id: command.application_id,
        key_id: command.key_id,
        kind: command.kind,
        outcome,
    };
    cipher.seal(&JsonCodec.encode_reply(&reply)?)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::from_yaml_str(
        "max_applications: 4\nmax_keys_per_application: 4\ncommand_queue_capacity: 8\n",
    )?;
    let agent = AgentBuilder::from_config(config).build(DemoCipher(0x42))?;
    let service = DemoCipher(0x42);

    let app: Identifier = "6f0b4c2e-4a51-4d5c-9b5b-0c7e6b1d2a10".parse()?;
    let key = Identifier::from_u128(1);

    println!("=== Two-phase resolution ===\n");
    let first = agent.resolve(&app, &key)?;
    println!("1. resolve -> {:?} ({} command queued)", first, agent.pending_commands());

    // Transport round trip: hand the command out, bring the reply back.
    while let Some(request) = agent.next_request()? {
        agent.accept_response(&serve(&request, &service)?)?;
    }
    for (reply, state) in agent.drain_replies()? {
        println!("2. applied {:?} reply -> {:?}", reply.kind, state);
    }

    match agent.resolve(&app, &key)? {
        Resolution::Resolved(value) => println!("3. resolve -> {} bytes of key material", value.len()),
        Resolution::Pending => println!("3. still pending"),
    }

    println!("\n=== Credential-gated clear ===\n");
    let denied = agent.clear_application_cache(&app, "demo-ta", "demo-password");
    println!("1. before SaveInfo: {:?}", denied.map_err(|e| e.to_string()));

    agent.submit_reply(ReplyNode {
        application_id: app,
        key_id: Identifier::NIL,
        kind: OperationKind::SaveInfo,
        outcome: ReplyOutcome::Info {
            info: AccountInfo {
                account: "demo-ta".into(),
                password: "demo-password".into(),
            },
        },
    })?;
    agent.drain_replies()?;

    let cleared = agent.clear_application_cache(&app, "demo-ta", "demo-password")?;
    println!("2. after SaveInfo: cleared {} key(s)", cleared);
    println!("3. cached applications: {}", agent.inspect(|cache| cache.len()));

    Ok(())
}
