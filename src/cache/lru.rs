//! Recency List Module
//!
//! Slab-backed doubly linked list ordering cache slots by recency of use.

// == Slot ==
#[derive(Debug)]
struct Slot<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Doubly linked list of values addressed by stable slot ids.
///
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Unlinking and relinking are O(1) given a slot id. Freed slot ids are
/// recycled, so an id is only meaningful while its value is linked.
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Links a value at the most-recently-used end and returns its slot id.
    pub fn push_front(&mut self, value: T) -> usize {
        let slot = Slot {
            value,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(slot);
                id
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.link_front(id);
        self.len += 1;
        id
    }

    // == Remove ==
    /// Unlinks the slot and hands its value back.
    pub fn remove(&mut self, id: usize) -> Option<T> {
        self.slots.get(id)?.as_ref()?;
        self.unlink(id);
        self.len -= 1;
        self.free.push(id);
        self.slots[id].take().map(|slot| slot.value)
    }

    // == Move To Front ==
    /// Relinks an existing slot at the most-recently-used end.
    ///
    /// Returns false if the id is not linked.
    pub fn move_to_front(&mut self, id: usize) -> bool {
        if !matches!(self.slots.get(id), Some(Some(_))) {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
        true
    }

    // == Back ==
    /// Returns the least recently used slot without unlinking it.
    #[cfg(test)]
    pub fn back(&self) -> Option<(usize, &T)> {
        let id = self.tail?;
        self.get(id).map(|value| (id, value))
    }

    // == Pop Back ==
    /// Unlinks and returns the least recently used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.slots.get(id)?.as_ref().map(|slot| &slot.value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iter ==
    /// Walks values from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn link_front(&mut self, id: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[id].as_mut() {
            slot.prev = None;
            slot.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(slot) = self.slots[h].as_mut() {
                    slot.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: usize) {
        let (prev, next) = match self.slots[id].as_mut() {
            Some(slot) => (slot.prev.take(), slot.next.take()),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.list.slots[self.cursor?].as_ref()?;
        self.cursor = slot.next;
        Some(&slot.value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(list: &RecencyList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_list_new() {
        let list: RecencyList<u32> = RecencyList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.back().is_none());
    }

    #[test]
    fn test_push_front_orders_mru_first() {
        let mut list = RecencyList::new();

        list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        assert_eq!(list.len(), 3);
        assert_eq!(order(&list), vec!["c", "b", "a"]);
        assert_eq!(list.back().map(|(_, v)| *v), Some("a"));
    }

    #[test]
    fn test_move_to_front() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        assert!(list.move_to_front(a));

        assert_eq!(order(&list), vec!["a", "c", "b"]);
        assert_eq!(list.back().map(|(_, v)| *v), Some("b"));
    }

    #[test]
    fn test_move_head_to_front_is_noop() {
        let mut list = RecencyList::new();

        list.push_front("a");
        let b = list.push_front("b");

        assert!(list.move_to_front(b));
        assert_eq!(order(&list), vec!["b", "a"]);
    }

    #[test]
    fn test_pop_back_in_lru_order() {
        let mut list = RecencyList::new();

        list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        assert_eq!(list.pop_back(), Some("a"));
        assert_eq!(list.pop_back(), Some("b"));
        assert_eq!(list.pop_back(), Some("c"));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_middle_keeps_chain() {
        let mut list = RecencyList::new();

        list.push_front("a");
        let b = list.push_front("b");
        list.push_front("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(order(&list), vec!["c", "a"]);
        assert_eq!(list.len(), 2);

        // Stale id is rejected
        assert_eq!(list.remove(b), None);
        assert!(!list.move_to_front(b));
    }

    #[test]
    fn test_slot_ids_are_recycled() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        list.remove(a);
        let b = list.push_front("b");

        assert_eq!(a, b);
        assert_eq!(order(&list), vec!["b"]);
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut list = RecencyList::new();

        let a = list.push_front("a");
        let b = list.push_front("b");
        let c = list.push_front("c");

        list.move_to_front(a);
        list.move_to_front(c);
        list.move_to_front(b);

        assert_eq!(order(&list), vec!["b", "c", "a"]);
        assert_eq!(list.pop_back(), Some("a"));
        assert_eq!(list.pop_back(), Some("c"));
        assert_eq!(list.pop_back(), Some("b"));
    }
}
