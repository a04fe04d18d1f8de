use std::ops::Range;
use std::time::Duration;

use bytes::Bytes;
use log::trace;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::name::{Name, NameComponent};
use crate::packets::{ContentType, Data, Exclude, ExcludeEntry, Interest, KeyLocator, MetaInfo};
use crate::signature::{signature_type, Sha256WithRsaSignature, Signature};
use crate::tlv::{types, TlvDecoder, TlvEncoder, TlvError};

/// Errors that can occur while encoding or decoding packets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error(transparent)]
    Tlv(#[from] TlvError),
    #[error("Unsupported signature type {0}")]
    UnsupportedSignatureType(u64),
    #[error("Content type {0:?} has no wire representation")]
    UnsupportedContentType(ContentType),
    #[error("Unrecognized key locator content")]
    UnrecognizedKeyLocator,
}

/// Byte range of an encoded packet that an external signature covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPortion {
    pub begin: usize,
    pub end: usize,
}

impl SignedPortion {
    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The covered bytes of `packet`
    ///
    /// Panics if the range is out of bounds, i.e. if `packet` is not the
    /// encoding this portion was reported for.
    pub fn slice<'a>(&self, packet: &'a [u8]) -> &'a [u8] {
        &packet[self.range()]
    }
}

/// A finished wire encoding plus the byte range an external signer must
/// cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEncoding {
    pub bytes: Bytes,
    pub signed_portion: SignedPortion,
}

impl SignedEncoding {
    pub fn signed_portion_bytes(&self) -> &[u8] {
        self.signed_portion.slice(&self.bytes)
    }
}

// Offsets measured from the back of the growing buffer. They stay valid
// while records are prepended and convert to front offsets only once the
// total length is known.
struct BackOffsets {
    begin: usize,
    end: usize,
}

/// Encode an Interest packet to NDN-TLV wire format
///
/// The wire nonce is always exactly 4 bytes: a stored 4-byte nonce goes
/// out verbatim, longer nonces are truncated and shorter ones are filled
/// from `rng`. The reported signed portion covers the name components
/// from the start of the first to the start of the last.
pub fn encode_interest<R: RngCore>(interest: &Interest, rng: &mut R) -> SignedEncoding {
    let mut encoder = TlvEncoder::new();
    let save_length = encoder.len();

    // Encode backwards.
    encoder.write_optional_duration_ms(types::INTEREST_LIFETIME, interest.interest_lifetime());
    encoder.write_optional_nonnegative_integer(types::SCOPE, interest.scope());
    write_nonce(interest.nonce(), rng, &mut encoder);
    encode_selectors(interest, &mut encoder);
    let name_offsets = encode_name(interest.name(), &mut encoder);
    encoder.write_type_and_length(types::INTEREST, encoder.len() - save_length);

    let total = encoder.len();
    let signed_portion = SignedPortion {
        begin: total - name_offsets.begin,
        end: total - name_offsets.end,
    };
    let bytes = encoder.finalize();
    trace!("Encoded interest {} ({} bytes)", interest.name(), bytes.len());
    SignedEncoding {
        bytes,
        signed_portion,
    }
}

/// Decode an Interest packet from NDN-TLV wire format
///
/// A Nonce record is required, but its value is preserved at whatever
/// length it has on the wire. Bytes past the end of the outer record are
/// ignored.
pub fn decode_interest(input: &[u8]) -> Result<Interest, WireError> {
    let mut decoder = TlvDecoder::new(input);
    let end_offset = decoder.read_nested_start(types::INTEREST)?;

    let mut interest = Interest::new(decode_name(&mut decoder)?);
    if decoder.peek_type(types::SELECTORS, end_offset)? {
        decode_selectors(&mut interest, &mut decoder)?;
    }
    let nonce = Bytes::copy_from_slice(decoder.read_blob(types::NONCE)?);
    interest.set_scope(decoder.read_optional_nonnegative_integer(types::SCOPE, end_offset)?);
    interest.set_interest_lifetime(
        decoder
            .read_optional_nonnegative_integer(types::INTEREST_LIFETIME, end_offset)?
            .map(Duration::from_millis),
    );
    // Assign the nonce last; the setters above clear it.
    interest.set_nonce(nonce);

    decoder.finish_nested(end_offset)?;
    trace!("Decoded interest {} ({} bytes)", interest.name(), end_offset);
    Ok(interest)
}

/// Encode a Data packet to NDN-TLV wire format
///
/// The reported signed portion runs from the start of the Name to the
/// end of the SignatureInfo block, so it covers everything except the
/// outer header and the SignatureValue.
pub fn encode_data(data: &Data) -> Result<SignedEncoding, WireError> {
    // Preallocate for a typical MTU-sized packet.
    let mut encoder = TlvEncoder::with_capacity(1500);
    let save_length = encoder.len();

    // Encode backwards.
    encoder.write_blob(types::SIGNATURE_VALUE, data.signature().signature_bytes());
    let end_from_back = encoder.len();

    encode_signature_info(data.signature(), &mut encoder);
    encoder.write_blob(types::CONTENT, data.content());
    encode_meta_info(data.meta_info(), &mut encoder)?;
    encode_name(data.name(), &mut encoder);
    let begin_from_back = encoder.len();

    encoder.write_type_and_length(types::DATA, encoder.len() - save_length);

    let total = encoder.len();
    let signed_portion = SignedPortion {
        begin: total - begin_from_back,
        end: total - end_from_back,
    };
    let bytes = encoder.finalize();
    trace!("Encoded data {} ({} bytes)", data.name(), bytes.len());
    Ok(SignedEncoding {
        bytes,
        signed_portion,
    })
}

/// Decode a Data packet from NDN-TLV wire format, also reporting which
/// byte range of `input` the signature covers
pub fn decode_data(input: &[u8]) -> Result<(Data, SignedPortion), WireError> {
    let mut decoder = TlvDecoder::new(input);
    let end_offset = decoder.read_nested_start(types::DATA)?;
    let begin = decoder.offset();

    let name = decode_name(&mut decoder)?;
    let meta_info = decode_meta_info(&mut decoder)?;
    let content = Bytes::copy_from_slice(decoder.read_blob(types::CONTENT)?);
    let mut signature = decode_signature_info(&mut decoder)?;
    let end = decoder.offset();

    signature.set_signature_bytes(Bytes::copy_from_slice(
        decoder.read_blob(types::SIGNATURE_VALUE)?,
    ));
    decoder.finish_nested(end_offset)?;

    let mut data = Data::new(name, content);
    data.set_meta_info(meta_info);
    data.set_signature(signature);
    trace!("Decoded data {} ({} bytes)", data.name(), end_offset);
    Ok((data, SignedPortion { begin, end }))
}

fn encode_name(name: &Name, encoder: &mut TlvEncoder) -> BackOffsets {
    let save_length = encoder.len();

    // Components go in last-to-first so each length is known before its
    // header. The end offset marks the start of the last component.
    let mut end_from_back = 0;
    for (i, component) in name.components().iter().enumerate().rev() {
        encoder.write_blob(types::NAME_COMPONENT, component.value());
        if i + 1 == name.len() {
            end_from_back = encoder.len();
        }
    }

    let begin_from_back = encoder.len();
    encoder.write_type_and_length(types::NAME, encoder.len() - save_length);

    if name.is_empty() {
        // No components, so the signed region collapses to a point.
        BackOffsets {
            begin: begin_from_back,
            end: begin_from_back,
        }
    } else {
        BackOffsets {
            begin: begin_from_back,
            end: end_from_back,
        }
    }
}

fn decode_name(decoder: &mut TlvDecoder) -> Result<Name, WireError> {
    let end_offset = decoder.read_nested_start(types::NAME)?;
    let mut name = Name::new();
    while decoder.offset() < end_offset {
        name.append(Bytes::copy_from_slice(
            decoder.read_blob(types::NAME_COMPONENT)?,
        ));
    }
    decoder.finish_nested(end_offset)?;
    Ok(name)
}

fn write_nonce<R: RngCore>(nonce: &Bytes, rng: &mut R, encoder: &mut TlvEncoder) {
    // The wire nonce is always exactly 4 bytes.
    if nonce.len() == 4 {
        encoder.write_blob(types::NONCE, nonce);
    } else if nonce.len() > 4 {
        encoder.write_blob(types::NONCE, &nonce[..4]);
    } else {
        let mut wire_nonce = [0u8; 4];
        rng.fill_bytes(&mut wire_nonce);
        wire_nonce[..nonce.len()].copy_from_slice(nonce);
        encoder.write_blob(types::NONCE, &wire_nonce);
    }
}

fn encode_selectors(interest: &Interest, encoder: &mut TlvEncoder) {
    let save_length = encoder.len();

    // Encode backwards.
    encoder.write_flag(types::MUST_BE_FRESH, interest.must_be_fresh());
    encoder.write_optional_nonnegative_integer(types::CHILD_SELECTOR, interest.child_selector());
    if !interest.exclude().is_empty() {
        encode_exclude(interest.exclude(), encoder);
    }
    if let Some(key_locator) = interest.key_locator() {
        encode_key_locator(types::PUBLISHER_PUBLIC_KEY_LOCATOR, Some(key_locator), encoder);
    } else if let Some(digest) = interest.publisher_public_key_digest() {
        // No full locator, but a legacy digest: encode it as a
        // digest-only locator.
        let digest_save_length = encoder.len();
        encoder.write_blob(types::KEY_LOCATOR_DIGEST, digest);
        encoder.write_type_and_length(
            types::PUBLISHER_PUBLIC_KEY_LOCATOR,
            encoder.len() - digest_save_length,
        );
    }
    encoder.write_optional_nonnegative_integer(
        types::MAX_SUFFIX_COMPONENTS,
        interest.max_suffix_components(),
    );
    encoder.write_optional_nonnegative_integer(
        types::MIN_SUFFIX_COMPONENTS,
        interest.min_suffix_components(),
    );

    // Only emit the wrapper if some selector was written.
    if encoder.len() != save_length {
        encoder.write_type_and_length(types::SELECTORS, encoder.len() - save_length);
    }
}

fn decode_selectors(interest: &mut Interest, decoder: &mut TlvDecoder) -> Result<(), WireError> {
    let end_offset = decoder.read_nested_start(types::SELECTORS)?;

    interest.set_min_suffix_components(
        decoder.read_optional_nonnegative_integer(types::MIN_SUFFIX_COMPONENTS, end_offset)?,
    );
    interest.set_max_suffix_components(
        decoder.read_optional_nonnegative_integer(types::MAX_SUFFIX_COMPONENTS, end_offset)?,
    );

    interest.set_publisher_public_key_digest(None);
    if decoder.peek_type(types::PUBLISHER_PUBLIC_KEY_LOCATOR, end_offset)? {
        let key_locator = decode_key_locator(types::PUBLISHER_PUBLIC_KEY_LOCATOR, decoder)?;
        if let Some(KeyLocator::Digest(digest)) = &key_locator {
            // Mirror digest locators into the legacy accessor.
            interest.set_publisher_public_key_digest(Some(digest.clone()));
        }
        interest.set_key_locator(key_locator);
    } else {
        interest.set_key_locator(None);
    }

    if decoder.peek_type(types::EXCLUDE, end_offset)? {
        interest.set_exclude(decode_exclude(decoder)?);
    } else {
        interest.set_exclude(Exclude::new());
    }

    interest.set_child_selector(
        decoder.read_optional_nonnegative_integer(types::CHILD_SELECTOR, end_offset)?,
    );
    interest.set_must_be_fresh(decoder.read_boolean(types::MUST_BE_FRESH, end_offset)?);

    decoder.finish_nested(end_offset)?;
    Ok(())
}

fn encode_exclude(exclude: &Exclude, encoder: &mut TlvEncoder) {
    let save_length = encoder.len();

    // Encode the entries backwards.
    for entry in exclude.entries().iter().rev() {
        match entry {
            ExcludeEntry::Any => encoder.write_type_and_length(types::ANY, 0),
            ExcludeEntry::Component(component) => {
                encoder.write_blob(types::NAME_COMPONENT, component.value());
            }
        }
    }
    encoder.write_type_and_length(types::EXCLUDE, encoder.len() - save_length);
}

fn decode_exclude(decoder: &mut TlvDecoder) -> Result<Exclude, WireError> {
    let end_offset = decoder.read_nested_start(types::EXCLUDE)?;

    let mut exclude = Exclude::new();
    loop {
        if decoder.peek_type(types::NAME_COMPONENT, end_offset)? {
            exclude.append_component(Bytes::copy_from_slice(
                decoder.read_blob(types::NAME_COMPONENT)?,
            ));
        } else if decoder.read_boolean(types::ANY, end_offset)? {
            exclude.append_any();
        } else {
            break;
        }
    }

    decoder.finish_nested(end_offset)?;
    Ok(exclude)
}

// The wrapper is always written, even for an absent locator, so an empty
// wrapper decodes back to None.
fn encode_key_locator(
    wrapper_type: u64,
    key_locator: Option<&KeyLocator>,
    encoder: &mut TlvEncoder,
) {
    let save_length = encoder.len();
    match key_locator {
        Some(KeyLocator::Name(name)) => {
            encode_name(name, encoder);
        }
        Some(KeyLocator::Digest(digest)) => {
            encoder.write_blob(types::KEY_LOCATOR_DIGEST, digest);
        }
        None => {}
    }
    encoder.write_type_and_length(wrapper_type, encoder.len() - save_length);
}

fn decode_key_locator(
    wrapper_type: u64,
    decoder: &mut TlvDecoder,
) -> Result<Option<KeyLocator>, WireError> {
    let end_offset = decoder.read_nested_start(wrapper_type)?;
    if decoder.offset() == end_offset {
        // Empty wrapper: the locator is absent.
        return Ok(None);
    }

    let key_locator = if decoder.peek_type(types::NAME, end_offset)? {
        KeyLocator::Name(decode_name(decoder)?)
    } else if decoder.peek_type(types::KEY_LOCATOR_DIGEST, end_offset)? {
        KeyLocator::Digest(Bytes::copy_from_slice(
            decoder.read_blob(types::KEY_LOCATOR_DIGEST)?,
        ))
    } else {
        return Err(WireError::UnrecognizedKeyLocator);
    };

    decoder.finish_nested(end_offset)?;
    Ok(Some(key_locator))
}

// The MetaInfo wrapper is always written, even when every field is at
// its default and the wrapper is empty.
fn encode_meta_info(meta_info: &MetaInfo, encoder: &mut TlvEncoder) -> Result<(), WireError> {
    let save_length = encoder.len();

    // Encode backwards.
    if let Some(final_block_id) = meta_info.final_block_id() {
        if !final_block_id.is_empty() {
            // FinalBlockId nests a single NameComponent record.
            let final_block_save_length = encoder.len();
            encoder.write_blob(types::NAME_COMPONENT, final_block_id.value());
            encoder.write_type_and_length(
                types::FINAL_BLOCK_ID,
                encoder.len() - final_block_save_length,
            );
        }
    }
    encoder.write_optional_duration_ms(types::FRESHNESS_PERIOD, meta_info.freshness_period());
    match meta_info.content_type() {
        // The default is implied by omission.
        ContentType::Blob => {}
        ContentType::Link | ContentType::Key => {
            encoder.write_nonnegative_integer(
                types::CONTENT_TYPE,
                meta_info.content_type().numeric_value(),
            );
        }
        ContentType::Nack => {
            return Err(WireError::UnsupportedContentType(ContentType::Nack));
        }
    }

    encoder.write_type_and_length(types::META_INFO, encoder.len() - save_length);
    Ok(())
}

fn decode_meta_info(decoder: &mut TlvDecoder) -> Result<MetaInfo, WireError> {
    let end_offset = decoder.read_nested_start(types::META_INFO)?;
    let mut meta_info = MetaInfo::new();

    let content_type =
        match decoder.read_optional_nonnegative_integer(types::CONTENT_TYPE, end_offset)? {
            Some(1) => ContentType::Link,
            Some(2) => ContentType::Key,
            // Unknown tags and an absent record both mean the default.
            _ => ContentType::Blob,
        };
    meta_info.set_content_type(content_type);

    meta_info.set_freshness_period(
        decoder
            .read_optional_nonnegative_integer(types::FRESHNESS_PERIOD, end_offset)?
            .map(Duration::from_millis),
    );

    if decoder.peek_type(types::FINAL_BLOCK_ID, end_offset)? {
        let final_block_end_offset = decoder.read_nested_start(types::FINAL_BLOCK_ID)?;
        meta_info.set_final_block_id(Some(NameComponent::new(Bytes::copy_from_slice(
            decoder.read_blob(types::NAME_COMPONENT)?,
        ))));
        decoder.finish_nested(final_block_end_offset)?;
    } else {
        meta_info.set_final_block_id(None);
    }

    decoder.finish_nested(end_offset)?;
    Ok(meta_info)
}

fn encode_signature_info(signature: &Signature, encoder: &mut TlvEncoder) {
    let save_length = encoder.len();

    match signature {
        Signature::Sha256WithRsa(signature) => {
            // Encode backwards.
            encode_key_locator(types::KEY_LOCATOR, signature.key_locator(), encoder);
            encoder.write_nonnegative_integer(
                types::SIGNATURE_TYPE,
                signature_type::SHA256_WITH_RSA,
            );
        }
    }

    encoder.write_type_and_length(types::SIGNATURE_INFO, encoder.len() - save_length);
}

fn decode_signature_info(decoder: &mut TlvDecoder) -> Result<Signature, WireError> {
    let end_offset = decoder.read_nested_start(types::SIGNATURE_INFO)?;

    let scheme_tag = decoder.read_nonnegative_integer(types::SIGNATURE_TYPE)?;
    let signature = match scheme_tag {
        signature_type::SHA256_WITH_RSA => {
            let mut signature = Sha256WithRsaSignature::new();
            signature.set_key_locator(decode_key_locator(types::KEY_LOCATOR, decoder)?);
            Signature::Sha256WithRsa(signature)
        }
        other => return Err(WireError::UnsupportedSignatureType(other)),
    };

    decoder.finish_nested(end_offset)?;
    Ok(signature)
}
