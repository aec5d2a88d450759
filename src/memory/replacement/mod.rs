/*!
 * Paged Replacement
 * FIFO, LRU and NRU victim selection and non-contiguous allocation
 */

mod paged;
mod victim;

pub(crate) use paged::allocate_paged;
pub use victim::{policy_for, FifoReplacement, LruReplacement, NruReplacement};
pub(crate) use victim::select_victim;
