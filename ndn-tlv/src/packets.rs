use std::time::Duration;

use bytes::Bytes;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::name::{Name, NameComponent};
use crate::signature::Signature;
use crate::wire::{self, SignedEncoding, SignedPortion, WireError};

/// Content type carried in the MetaInfo of a Data packet
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Blob,
    Link,
    Key,
    /// Application-level negative acknowledgement. Not representable on
    /// the wire; encoding a Data packet with this type fails.
    Nack,
}

impl ContentType {
    /// Numeric tag assigned by the packet format
    pub fn numeric_value(&self) -> u64 {
        match self {
            ContentType::Blob => 0,
            ContentType::Link => 1,
            ContentType::Key => 2,
            ContentType::Nack => 3,
        }
    }
}

/// Key locator for signatures: the name of the signing key, or a digest
/// of the key itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLocator {
    Name(Name),
    Digest(Bytes),
}

/// One entry of an Exclude filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeEntry {
    Component(NameComponent),
    /// Wildcard covering the open range between its neighboring entries
    Any,
}

/// Exclude filter for Interest packets
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclude {
    entries: Vec<ExcludeEntry>,
}

impl Exclude {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn append_component(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.entries.push(ExcludeEntry::Component(component.into()));
        self
    }

    pub fn append_any(&mut self) -> &mut Self {
        self.entries.push(ExcludeEntry::Any);
        self
    }

    pub fn entries(&self) -> &[ExcludeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Check whether the filter excludes the given component
    ///
    /// A component entry matches by equality. An Any entry matches the
    /// open range between its neighboring component entries; the bounds
    /// themselves match through their own entries.
    pub fn matches(&self, component: &NameComponent) -> bool {
        let mut i = 0;
        while i < self.entries.len() {
            match &self.entries[i] {
                ExcludeEntry::Component(entry) => {
                    if entry == component {
                        return true;
                    }
                    i += 1;
                }
                ExcludeEntry::Any => {
                    let lower = if i > 0 {
                        match &self.entries[i - 1] {
                            ExcludeEntry::Component(c) => Some(c),
                            ExcludeEntry::Any => None,
                        }
                    } else {
                        None
                    };

                    // A run of consecutive Any entries shares one upper bound.
                    let mut upper_index = i + 1;
                    while matches!(self.entries.get(upper_index), Some(ExcludeEntry::Any)) {
                        upper_index += 1;
                    }
                    let upper = match self.entries.get(upper_index) {
                        Some(ExcludeEntry::Component(c)) => Some(c),
                        _ => None,
                    };

                    match (lower, upper) {
                        (Some(lower), Some(upper)) => {
                            if lower < component && component < upper {
                                return true;
                            }
                        }
                        (Some(lower), None) => {
                            if lower < component {
                                return true;
                            }
                        }
                        (None, Some(upper)) => {
                            if component < upper {
                                return true;
                            }
                        }
                        (None, None) => return true,
                    }
                    i = upper_index;
                }
            }
        }
        false
    }
}

/// Interest packet structure
///
/// Every setter except `set_nonce` clears the stored nonce, so a
/// modified Interest gets a fresh nonce the next time it is encoded.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    name: Name,
    min_suffix_components: Option<u64>,
    max_suffix_components: Option<u64>,
    key_locator: Option<KeyLocator>,
    publisher_public_key_digest: Option<Bytes>,
    exclude: Exclude,
    child_selector: Option<u64>,
    must_be_fresh: bool,
    scope: Option<u64>,
    interest_lifetime: Option<Duration>,
    nonce: Bytes,
}

impl Interest {
    /// Create a new Interest with the given name
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn set_name(&mut self, name: Name) {
        self.name = name;
        self.nonce = Bytes::new();
    }

    pub fn min_suffix_components(&self) -> Option<u64> {
        self.min_suffix_components
    }

    pub fn set_min_suffix_components(&mut self, count: Option<u64>) {
        self.min_suffix_components = count;
        self.nonce = Bytes::new();
    }

    pub fn max_suffix_components(&self) -> Option<u64> {
        self.max_suffix_components
    }

    pub fn set_max_suffix_components(&mut self, count: Option<u64>) {
        self.max_suffix_components = count;
        self.nonce = Bytes::new();
    }

    pub fn key_locator(&self) -> Option<&KeyLocator> {
        self.key_locator.as_ref()
    }

    pub fn set_key_locator(&mut self, key_locator: Option<KeyLocator>) {
        self.key_locator = key_locator;
        self.nonce = Bytes::new();
    }

    /// Raw publisher key digest, kept for peers that predate full key
    /// locators
    pub fn publisher_public_key_digest(&self) -> Option<&Bytes> {
        self.publisher_public_key_digest.as_ref()
    }

    pub fn set_publisher_public_key_digest(&mut self, digest: Option<Bytes>) {
        self.publisher_public_key_digest = digest;
        self.nonce = Bytes::new();
    }

    pub fn exclude(&self) -> &Exclude {
        &self.exclude
    }

    pub fn set_exclude(&mut self, exclude: Exclude) {
        self.exclude = exclude;
        self.nonce = Bytes::new();
    }

    pub fn child_selector(&self) -> Option<u64> {
        self.child_selector
    }

    pub fn set_child_selector(&mut self, child_selector: Option<u64>) {
        self.child_selector = child_selector;
        self.nonce = Bytes::new();
    }

    pub fn must_be_fresh(&self) -> bool {
        self.must_be_fresh
    }

    pub fn set_must_be_fresh(&mut self, must_be_fresh: bool) {
        self.must_be_fresh = must_be_fresh;
        self.nonce = Bytes::new();
    }

    pub fn scope(&self) -> Option<u64> {
        self.scope
    }

    pub fn set_scope(&mut self, scope: Option<u64>) {
        self.scope = scope;
        self.nonce = Bytes::new();
    }

    pub fn interest_lifetime(&self) -> Option<Duration> {
        self.interest_lifetime
    }

    pub fn set_interest_lifetime(&mut self, lifetime: Option<Duration>) {
        self.interest_lifetime = lifetime;
        self.nonce = Bytes::new();
    }

    /// Stored nonce; may be empty or any length until the Interest is
    /// encoded, which stamps exactly 4 bytes onto the wire
    pub fn nonce(&self) -> &Bytes {
        &self.nonce
    }

    pub fn set_nonce(&mut self, nonce: impl Into<Bytes>) {
        self.nonce = nonce.into();
    }

    /// Set the minimum number of suffix components
    pub fn with_min_suffix_components(mut self, count: u64) -> Self {
        self.set_min_suffix_components(Some(count));
        self
    }

    /// Set the maximum number of suffix components
    pub fn with_max_suffix_components(mut self, count: u64) -> Self {
        self.set_max_suffix_components(Some(count));
        self
    }

    /// Set the publisher key locator
    pub fn with_key_locator(mut self, key_locator: KeyLocator) -> Self {
        self.set_key_locator(Some(key_locator));
        self
    }

    /// Set the legacy publisher key digest
    pub fn with_publisher_public_key_digest(mut self, digest: impl Into<Bytes>) -> Self {
        self.set_publisher_public_key_digest(Some(digest.into()));
        self
    }

    /// Set the exclude filter
    pub fn with_exclude(mut self, exclude: Exclude) -> Self {
        self.set_exclude(exclude);
        self
    }

    /// Set the child selector
    pub fn with_child_selector(mut self, child_selector: u64) -> Self {
        self.set_child_selector(Some(child_selector));
        self
    }

    /// Set the must_be_fresh flag
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.set_must_be_fresh(must_be_fresh);
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: u64) -> Self {
        self.set_scope(Some(scope));
        self
    }

    /// Set the interest lifetime
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.set_interest_lifetime(Some(lifetime));
        self
    }

    /// Set the nonce; chain this last, since the other builders clear it
    pub fn with_nonce(mut self, nonce: impl Into<Bytes>) -> Self {
        self.set_nonce(nonce);
        self
    }

    /// Check if a Data packet with the given name can satisfy this
    /// Interest, honoring the suffix bounds and the exclude filter
    ///
    /// The suffix count includes one for the implicit digest component
    /// of the Data name.
    pub fn matches_name(&self, name: &Name) -> bool {
        if !self.name.is_prefix_of(name) {
            return false;
        }

        let suffix_count = (name.len() + 1 - self.name.len()) as u64;
        if let Some(min) = self.min_suffix_components {
            if suffix_count < min {
                return false;
            }
        }
        if let Some(max) = self.max_suffix_components {
            if suffix_count > max {
                return false;
            }
        }

        if !self.exclude.is_empty() {
            if let Some(next_component) = name.get(self.name.len()) {
                if self.exclude.matches(next_component) {
                    return false;
                }
            }
        }
        true
    }

    /// Encode to NDN-TLV wire format
    ///
    /// The nonce is normalized to 4 bytes on the wire: a stored 4-byte
    /// nonce goes out verbatim, longer nonces are truncated and shorter
    /// ones are filled from `rng`.
    pub fn encode<R: RngCore>(&self, rng: &mut R) -> SignedEncoding {
        wire::encode_interest(self, rng)
    }

    /// Decode from NDN-TLV wire format
    pub fn decode(input: &[u8]) -> Result<Self, WireError> {
        wire::decode_interest(input)
    }
}

/// MetaInfo for Data packets
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    content_type: ContentType,
    freshness_period: Option<Duration>,
    final_block_id: Option<NameComponent>,
}

impl MetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
    }

    pub fn freshness_period(&self) -> Option<Duration> {
        self.freshness_period
    }

    pub fn set_freshness_period(&mut self, freshness_period: Option<Duration>) {
        self.freshness_period = freshness_period;
    }

    pub fn final_block_id(&self) -> Option<&NameComponent> {
        self.final_block_id.as_ref()
    }

    pub fn set_final_block_id(&mut self, final_block_id: Option<NameComponent>) {
        self.final_block_id = final_block_id;
    }
}

/// Data packet structure
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    name: Name,
    meta_info: MetaInfo,
    content: Bytes,
    signature: Signature,
}

impl Data {
    /// Create a new Data packet with the given name and content
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            meta_info: MetaInfo::default(),
            content: content.into(),
            signature: Signature::default(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn set_name(&mut self, name: Name) {
        self.name = name;
    }

    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    pub fn meta_info_mut(&mut self) -> &mut MetaInfo {
        &mut self.meta_info
    }

    pub fn set_meta_info(&mut self, meta_info: MetaInfo) {
        self.meta_info = meta_info;
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Bytes>) {
        self.content = content.into();
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn signature_mut(&mut self) -> &mut Signature {
        &mut self.signature
    }

    pub fn set_signature(&mut self, signature: Signature) {
        self.signature = signature;
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.meta_info.set_content_type(content_type);
        self
    }

    /// Set the freshness period
    pub fn with_freshness_period(mut self, freshness_period: Duration) -> Self {
        self.meta_info.set_freshness_period(Some(freshness_period));
        self
    }

    /// Set the final block id
    pub fn with_final_block_id(mut self, final_block_id: impl Into<NameComponent>) -> Self {
        self.meta_info.set_final_block_id(Some(final_block_id.into()));
        self
    }

    /// Set the signature
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Encode to NDN-TLV wire format
    ///
    /// Fails only for content types with no wire representation.
    pub fn encode(&self) -> Result<SignedEncoding, WireError> {
        wire::encode_data(self)
    }

    /// Decode from NDN-TLV wire format, also reporting which byte range
    /// of `input` the signature covers
    pub fn decode(input: &[u8]) -> Result<(Self, SignedPortion), WireError> {
        wire::decode_data(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_builders() {
        let name = Name::from_uri("/test/interest").unwrap();
        let mut exclude = Exclude::new();
        exclude.append_component("z");

        let interest = Interest::new(name.clone())
            .with_min_suffix_components(1)
            .with_max_suffix_components(4)
            .with_key_locator(KeyLocator::Name(Name::from_uri("/key").unwrap()))
            .with_exclude(exclude.clone())
            .with_child_selector(1)
            .with_must_be_fresh(true)
            .with_scope(2)
            .with_lifetime(Duration::from_secs(10))
            .with_nonce(Bytes::from_static(&[1, 2, 3, 4]));

        assert_eq!(interest.name(), &name);
        assert_eq!(interest.min_suffix_components(), Some(1));
        assert_eq!(interest.max_suffix_components(), Some(4));
        assert_eq!(
            interest.key_locator(),
            Some(&KeyLocator::Name(Name::from_uri("/key").unwrap()))
        );
        assert_eq!(interest.exclude(), &exclude);
        assert_eq!(interest.child_selector(), Some(1));
        assert!(interest.must_be_fresh());
        assert_eq!(interest.scope(), Some(2));
        assert_eq!(interest.interest_lifetime(), Some(Duration::from_secs(10)));
        assert_eq!(interest.nonce().as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_setters_clear_nonce() {
        let mut interest = Interest::new(Name::from_uri("/a").unwrap());
        interest.set_nonce(Bytes::from_static(&[9, 9, 9, 9]));
        assert!(!interest.nonce().is_empty());

        interest.set_scope(Some(1));
        assert!(interest.nonce().is_empty());

        interest.set_nonce(Bytes::from_static(&[9, 9, 9, 9]));
        interest.set_must_be_fresh(true);
        assert!(interest.nonce().is_empty());

        interest.set_nonce(Bytes::from_static(&[9, 9, 9, 9]));
        interest.set_name(Name::from_uri("/b").unwrap());
        assert!(interest.nonce().is_empty());

        // set_nonce itself keeps the value.
        interest.set_nonce(Bytes::from_static(&[9, 9, 9, 9]));
        assert_eq!(interest.nonce().as_ref(), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_matches_name_prefix_and_suffix_bounds() {
        let interest = Interest::new(Name::from_uri("/a").unwrap())
            .with_min_suffix_components(2)
            .with_max_suffix_components(2);

        // Suffix count includes the implicit digest component.
        assert!(interest.matches_name(&Name::from_uri("/a/b").unwrap()));
        assert!(!interest.matches_name(&Name::from_uri("/a").unwrap()));
        assert!(!interest.matches_name(&Name::from_uri("/a/b/c").unwrap()));
        assert!(!interest.matches_name(&Name::from_uri("/x/b").unwrap()));
    }

    #[test]
    fn test_matches_name_applies_exclude() {
        let mut exclude = Exclude::new();
        exclude.append_component("bad");

        let interest =
            Interest::new(Name::from_uri("/a").unwrap()).with_exclude(exclude);

        assert!(interest.matches_name(&Name::from_uri("/a/good").unwrap()));
        assert!(!interest.matches_name(&Name::from_uri("/a/bad").unwrap()));
        // The filter applies to the first suffix component only.
        assert!(interest.matches_name(&Name::from_uri("/a/good/bad").unwrap()));
    }

    #[test]
    fn test_exclude_equality_entries() {
        let mut exclude = Exclude::new();
        exclude.append_component("m");

        assert!(exclude.matches(&NameComponent::from("m")));
        assert!(!exclude.matches(&NameComponent::from("n")));
    }

    #[test]
    fn test_exclude_any_ranges() {
        // [a, Any, z]: everything from "a" through "z".
        let mut between = Exclude::new();
        between.append_component("a");
        between.append_any();
        between.append_component("z");

        assert!(between.matches(&NameComponent::from("a")));
        assert!(between.matches(&NameComponent::from("m")));
        assert!(between.matches(&NameComponent::from("z")));
        assert!(!between.matches(&NameComponent::from("zz")));

        // [Any, m]: everything up to "m".
        let mut below = Exclude::new();
        below.append_any();
        below.append_component("m");

        assert!(below.matches(&NameComponent::from("a")));
        assert!(below.matches(&NameComponent::from("m")));
        assert!(!below.matches(&NameComponent::from("n")));

        // [m, Any]: everything from "m" on.
        let mut above = Exclude::new();
        above.append_component("m");
        above.append_any();

        assert!(!above.matches(&NameComponent::from("a")));
        assert!(above.matches(&NameComponent::from("m")));
        assert!(above.matches(&NameComponent::from("zzz")));

        // A lone Any matches everything.
        let mut all = Exclude::new();
        all.append_any();
        assert!(all.matches(&NameComponent::from("anything")));
    }

    #[test]
    fn test_exclude_any_run_shares_bounds() {
        let mut exclude = Exclude::new();
        exclude.append_component("a");
        exclude.append_any();
        exclude.append_any();
        exclude.append_component("c");

        assert!(exclude.matches(&NameComponent::from("b")));
        assert!(!exclude.matches(&NameComponent::from("d")));
    }

    #[test]
    fn test_content_type_numeric_values() {
        assert_eq!(ContentType::Blob.numeric_value(), 0);
        assert_eq!(ContentType::Link.numeric_value(), 1);
        assert_eq!(ContentType::Key.numeric_value(), 2);
        assert_eq!(ContentType::Nack.numeric_value(), 3);
        assert_eq!(ContentType::default(), ContentType::Blob);
    }

    #[test]
    fn test_data_builders() {
        let name = Name::from_uri("/test/data").unwrap();
        let data = Data::new(name.clone(), &b"Hello, world!"[..])
            .with_content_type(ContentType::Key)
            .with_freshness_period(Duration::from_secs(3600))
            .with_final_block_id(NameComponent::from("seg9"));

        assert_eq!(data.name(), &name);
        assert_eq!(data.content().as_ref(), b"Hello, world!");
        assert_eq!(data.meta_info().content_type(), ContentType::Key);
        assert_eq!(
            data.meta_info().freshness_period(),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(
            data.meta_info().final_block_id(),
            Some(&NameComponent::from("seg9"))
        );
    }
}
