//! Ordered fallback over selector-like candidates.
//!
//! ```
//! use chatprobe_core::fallback::try_in_order;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let candidates = ["#missing", "#broken", ".answer"];
//! let hit = rt.block_on(try_in_order("doc", &candidates, |c| async move {
//!     match *c {
//!         "#broken" => Err(anyhow::anyhow!("no such element")),
//!         ".answer" => Ok(Some(42)),
//!         _ => Ok(None),
//!     }
//! }));
//! let hit = hit.unwrap();
//! assert_eq!((hit.index, *hit.candidate, hit.value), (2, ".answer", 42));
//! ```
use std::fmt::Display;
use std::future::Future;
use tracing::debug;

/// The candidate that produced a value, and the value itself.
#[derive(Debug)]
pub struct Hit<'a, T, R> {
    pub index: usize,
    pub candidate: &'a T,
    pub value: R,
}

/// Probe `candidates` in list order and stop at the first `Ok(Some(_))`.
///
/// Misses (`Ok(None)`) and failures (`Err`) are logged under `phase` and the
/// walk continues; `None` means every candidate was tried.
pub async fn try_in_order<'a, T, R, F, Fut>(
    phase: &str,
    candidates: &'a [T],
    mut probe: F,
) -> Option<Hit<'a, T, R>>
where
    T: Display,
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = anyhow::Result<Option<R>>>,
{
    for (index, candidate) in candidates.iter().enumerate() {
        match probe(candidate).await {
            Ok(Some(value)) => {
                debug!(target: "chatprobe.fallback", phase, index, %candidate, "candidate accepted");
                return Some(Hit {
                    index,
                    candidate,
                    value,
                });
            }
            Ok(None) => {
                debug!(target: "chatprobe.fallback", phase, index, %candidate, "candidate missed")
            }
            Err(e) => {
                debug!(target: "chatprobe.fallback", phase, index, %candidate, error = %e, "candidate failed")
            }
        }
    }
    debug!(target: "chatprobe.fallback", phase, tried = candidates.len(), "candidates exhausted");
    None
}
