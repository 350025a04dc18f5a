//! Sender access policy for inbound messages

use std::collections::HashSet;

/// Decides whether an inbound sender may receive a reply
pub trait SenderPolicy: Send + Sync {
    fn allows(&self, sender: &str) -> bool;
}

impl<F> SenderPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, sender: &str) -> bool {
        self(sender)
    }
}

/// Every sender is allowed
pub struct AllowAll;

impl SenderPolicy for AllowAll {
    fn allows(&self, _sender: &str) -> bool {
        true
    }
}

/// Only listed numbers are allowed. Comparison ignores the carrier scheme,
/// so `whatsapp:+1555…` matches a configured `+1555…`.
pub struct Allowlist {
    numbers: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            numbers: numbers
                .into_iter()
                .map(|n| bare_number(n.as_ref()).to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

impl SenderPolicy for Allowlist {
    fn allows(&self, sender: &str) -> bool {
        self.numbers.contains(bare_number(sender))
    }
}

/// Strip a `scheme:` prefix such as `whatsapp:`
pub fn bare_number(sender: &str) -> &str {
    let sender = sender.trim();
    match sender.split_once(':') {
        Some((_, number)) => number.trim(),
        None => sender,
    }
}
