//! Name ordering shared by page listings and directory listings
//!
//! Names are lower-cased and then compared with the Unicode root collation,
//! so punctuation sorts before digits, digits before letters, and accented
//! letters next to their base letter.

use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use log::warn;

thread_local! {
    static ROOT_COLLATOR: Option<Collator> = build_collator();
}

fn build_collator() -> Option<Collator> {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            warn!("Root collation unavailable ({:?}), falling back to code point order", e);
            None
        }
    }
}

/// Case-insensitive, locale-aware comparison of two names
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    ROOT_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(&a, &b),
        None => a.cmp(&b),
    })
}
