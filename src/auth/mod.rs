//! Signed join tokens binding a player to a room.
//!
//! token format: base64url(json).base64url(hmac_sha256(json))

use anyhow::Context;
use base64::Engine;
use once_cell::sync::OnceCell;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

static HMAC_KEY: OnceCell<[u8; 32]> = OnceCell::new();

/// Install the process-wide token key. Reads `SZKIC_HMAC_KEY` (hex) or
/// falls back to a random key, in which case tokens die with the process.
pub fn init_key() {
    let key_bytes = std::env::var("SZKIC_HMAC_KEY")
        .ok()
        .and_then(|hex| hex::decode(hex).ok())
        .and_then(|v| v.try_into().ok())
        .unwrap_or_else(|| {
            let mut kb = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut kb);
            kb
        });
    HMAC_KEY.set(key_bytes).ok();
}

#[derive(Serialize, Deserialize)]
struct Claims {
    room: Uuid,
    player: Uuid,
    iat: i64,
}

pub fn issue_token(room: Uuid, player: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        room,
        player,
        iat: OffsetDateTime::now_utc().unix_timestamp(),
    };
    let payload = serde_json::to_vec(&claims)?;
    let part1 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
    let sig = hmac_sha256(&payload)?;
    let part2 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sig);
    Ok(format!("{}.{}", part1, part2))
}

pub fn verify_token(token: &str) -> anyhow::Result<(Uuid, Uuid)> {
    let mut parts = token.split('.');
    let p1 = parts.next().context("missing payload")?;
    let p2 = parts.next().context("missing sig")?;
    if parts.next().is_some() {
        anyhow::bail!("too many parts")
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p1)?;
    let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p2)?;
    let expected = hmac_sha256(&payload)?;
    if sig != expected {
        anyhow::bail!("bad signature")
    }
    let c: Claims = serde_json::from_slice(&payload)?;
    Ok((c.room, c.player))
}

fn hmac_sha256(data: &[u8]) -> anyhow::Result<[u8; 32]> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    type HmacSha256 = Hmac<Sha256>;
    let key = HMAC_KEY.get().context("hmac key missing")?;
    let mut mac = HmacSha256::new_from_slice(key).unwrap();
    mac.update(data);
    let out = mac.finalize().into_bytes();
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_and_reject_tampering() {
        init_key();
        let room = Uuid::new_v4();
        let player = Uuid::new_v4();
        let token = issue_token(room, player).unwrap();
        assert_eq!(verify_token(&token).unwrap(), (room, player));

        let mut tampered = token.clone();
        tampered.replace_range(0..1, if token.starts_with('A') { "B" } else { "A" });
        assert!(verify_token(&tampered).is_err());
        assert!(verify_token("not-a-token").is_err());
    }
}
