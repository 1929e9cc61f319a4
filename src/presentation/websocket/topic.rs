//! Topic naming.
//!
//! A topic is the broker routing key: the room name for room channels,
//! or a deterministic pairwise key for direct chats so both ends of a
//! conversation land on the same feed regardless of who connects first.

/// Compute the direct-chat topic for two user identities.
///
/// Pure and symmetric: `direct_topic(a, b) == direct_topic(b, a)`.
pub fn direct_topic(a: i64, b: i64) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", lo, hi)
}
