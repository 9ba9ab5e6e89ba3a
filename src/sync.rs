use core::cell::Cell;

use critical_section::Mutex;

/// Single-slot mailbox holding the most recent value a producer published.
///
/// Publishing overwrites; reading never consumes. Both sides take one short
/// critical section, so this is safe to share between an interrupt and the
/// foreground loop.
pub struct Latest<T: Copy> {
    slot: Mutex<Cell<Option<T>>>,
}

impl<T: Copy> Latest<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish(&self, value: T) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(value)));
    }

    pub fn latest(&self) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }
}

impl<T: Copy> Default for Latest<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_until_published() {
        let mailbox: Latest<u32> = Latest::new();
        assert_eq!(mailbox.latest(), None);
    }

    #[test]
    fn newest_value_wins_and_reads_do_not_consume() {
        let mailbox = Latest::new();
        mailbox.publish(1);
        mailbox.publish(2);
        assert_eq!(mailbox.latest(), Some(2));
        assert_eq!(mailbox.latest(), Some(2));
    }
}
