use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use ndn_tlv::{
    ContentType, Data, Interest, KeyLocator, Name, Sha256WithRsaSignature, Signature,
};

/// Render bytes as lowercase hex for display
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🔏 NDN-TLV Signed Data Demo");
    println!("===========================");

    // Build a Data packet. The signature value stays empty until a signer
    // has seen the encoding.
    let mut data = Data::new(
        Name::from_uri("/demo/weather/temperature")?,
        &b"21.5 C"[..],
    )
    .with_content_type(ContentType::Blob)
    .with_freshness_period(Duration::from_secs(60))
    .with_signature(Signature::Sha256WithRsa(
        Sha256WithRsaSignature::new()
            .with_key_locator(KeyLocator::Name(Name::from_uri("/demo/keys/alice")?)),
    ));

    // First pass: encode to learn which bytes the signature must cover.
    let unsigned = data.encode()?;
    println!("📦 Encoded {} bytes", unsigned.bytes.len());
    println!(
        "✍️  Signed portion covers bytes {}..{}",
        unsigned.signed_portion.begin, unsigned.signed_portion.end
    );

    // Stand-in for a real signer: digest the signed portion. An RSA or
    // ECDSA key would sign these same bytes.
    let signature_bytes = Sha256::digest(unsigned.signed_portion_bytes());
    data.signature_mut()
        .set_signature_bytes(Bytes::copy_from_slice(&signature_bytes));

    // Second pass: the signature value sits outside the signed portion,
    // so attaching it does not invalidate the digest.
    let signed = data.encode()?;
    println!("📤 Final packet: {} bytes", signed.bytes.len());

    // Receiver side: decode and verify.
    let (received, portion) = Data::decode(&signed.bytes)?;
    let recomputed = Sha256::digest(portion.slice(&signed.bytes));
    let carried = received.signature().signature_bytes();

    println!("🔐 Carried digest:    {}", hex(carried));
    println!("🔐 Recomputed digest: {}", hex(&recomputed));
    if carried.as_ref() == recomputed.as_slice() {
        println!("✅ Signature verifies");
    } else {
        println!("❌ Signature mismatch");
    }

    // An Interest for the same prefix finds this packet.
    let interest = Interest::new(Name::from_uri("/demo/weather")?)
        .with_must_be_fresh(true)
        .with_lifetime(Duration::from_secs(4));
    println!(
        "🔎 Interest {} matches {}: {}",
        interest.name(),
        received.name(),
        interest.matches_name(received.name())
    );

    let expressed = interest.encode(&mut rand::thread_rng());
    let on_the_wire = Interest::decode(&expressed.bytes)?;
    println!("🎲 Stamped nonce: {}", hex(on_the_wire.nonce()));

    Ok(())
}
