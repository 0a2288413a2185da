//! The ordered message index.
//!
//! [`OrderedMessages`] is a treap: a binary search tree on the message
//! identifier that is simultaneously max-heap ordered on a balancing key
//! derived deterministically from the identifier.  Expected depth is
//! logarithmic without any per-node bookkeeping beyond the two child links.
//!
//! Besides membership, every entry carries two adjacency flags,
//! `have_previous` and `have_next`, asserting that the immediate neighbor in
//! the total message order is also known to the dialog.  Runs of messages
//! whose flags are set form gap-free stretches of history; the `attach_*`
//! operations are the only way the flags are raised.
//!
//! Misuse — inserting a duplicate, erasing an absent identifier, attaching a
//! message with no neighbor — is a bug in the caller and panics.

use crate::message_id::MessageId;

type Link = Option<Box<OrderedMessage>>;

// ─── OrderedMessage ───────────────────────────────────────────────────────────

/// One entry of the index.
#[derive(Debug)]
pub struct OrderedMessage {
    /// The identifier this entry stands for.
    pub message_id: MessageId,
    /// The immediate older neighbor is also known to the dialog.
    pub have_previous: bool,
    /// The immediate newer neighbor is also known to the dialog.
    pub have_next: bool,
    random_y: i32,
    left: Link,
    right: Link,
}

/// Adjacency flags reported by [`OrderedMessages::auto_attach_message`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachInfo {
    /// The new message continues a known run of older messages.
    pub have_previous: bool,
    /// The new message is continued by a known newer message.
    pub have_next: bool,
}

fn balance_key(message_id: MessageId) -> i32 {
    (message_id.get().wrapping_mul(2101234567)) as u32 as i32
}

// ─── OrderedMessages ──────────────────────────────────────────────────────────

/// The ordered set of message identifiers currently known to one dialog.
#[derive(Debug, Default)]
pub struct OrderedMessages {
    root: Link,
}

impl OrderedMessages {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `message_id` and return a reference to the new entry.
    ///
    /// The reference stays valid until the identifier is erased; adjacency
    /// flags may be set through it directly.
    ///
    /// # Panics
    /// Panics if the identifier is already present.
    pub fn insert(&mut self, message_id: MessageId) -> &mut OrderedMessage {
        let node = Box::new(OrderedMessage {
            message_id,
            have_previous: false,
            have_next: false,
            random_y: balance_key(message_id),
            left: None,
            right: None,
        });
        Self::insert_into(&mut self.root, node)
    }

    /// Descend while the current subtree root outranks the new node, then
    /// split the displaced subtree around the new key.
    fn insert_into(link: &mut Link, mut node: Box<OrderedMessage>) -> &mut OrderedMessage {
        // `Some(true)` descends right, `Some(false)` left, `None` cuts here.
        let go_right = match link {
            Some(cur) if cur.random_y >= node.random_y => {
                if cur.message_id == node.message_id {
                    panic!("duplicate {} in the ordered index", node.message_id);
                }
                Some(cur.message_id < node.message_id)
            }
            _ => None,
        };

        match go_right {
            Some(true) => Self::insert_into(&mut link.as_mut().unwrap().right, node),
            Some(false) => Self::insert_into(&mut link.as_mut().unwrap().left, node),
            None => {
                let displaced = link.take();
                let (lower, upper) = Self::split(displaced, node.message_id);
                node.left = lower;
                node.right = upper;
                *link = Some(node);
                link.as_mut().unwrap()
            }
        }
    }

    /// Split `cur` into the entries below and above `message_id`, threading
    /// each node onto the end of the matching spine.
    fn split(mut cur: Link, message_id: MessageId) -> (Link, Link) {
        let mut lower: Link = None;
        let mut upper: Link = None;
        let mut lower_slot = &mut lower;
        let mut upper_slot = &mut upper;

        while let Some(mut node) = cur {
            if node.message_id < message_id {
                cur = node.right.take();
                *lower_slot = Some(node);
                if let Some(placed) = lower_slot {
                    lower_slot = &mut placed.right;
                }
            } else {
                cur = node.left.take();
                *upper_slot = Some(node);
                if let Some(placed) = upper_slot {
                    upper_slot = &mut placed.left;
                }
            }
        }
        (lower, upper)
    }

    /// Remove `message_id`, melding its children in its place.
    ///
    /// # Panics
    /// Panics if the identifier is absent.
    pub fn erase(&mut self, message_id: MessageId) {
        Self::erase_at(&mut self.root, message_id);
    }

    fn erase_at(link: &mut Link, message_id: MessageId) {
        let Some(node) = link else {
            panic!("erasing unknown {message_id} from the ordered index");
        };
        if node.message_id < message_id {
            return Self::erase_at(&mut node.right, message_id);
        }
        if node.message_id > message_id {
            return Self::erase_at(&mut node.left, message_id);
        }

        // Meld the children: the higher-ranked root wins each step and the
        // loser's side is filled in from the remaining subtree.
        let mut removed = link.take().unwrap();
        let mut left = removed.left.take();
        let mut right = removed.right.take();
        let mut slot = link;
        while left.is_some() || right.is_some() {
            let pick_right = match (&left, &right) {
                (Some(l), Some(r)) => r.random_y > l.random_y,
                (None, Some(_)) => true,
                _ => false,
            };
            if pick_right {
                let mut node = right.take().unwrap();
                right = node.left.take();
                *slot = Some(node);
                if let Some(placed) = slot {
                    slot = &mut placed.left;
                }
            } else {
                let mut node = left.take().unwrap();
                left = node.right.take();
                *slot = Some(node);
                if let Some(placed) = slot {
                    slot = &mut placed.right;
                }
            }
        }
    }

    // ─── Lookup ──────────────────────────────────────────────────────────────

    fn node(&self, message_id: MessageId) -> Option<&OrderedMessage> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if node.message_id < message_id {
                cur = node.right.as_deref();
            } else if node.message_id > message_id {
                cur = node.left.as_deref();
            } else {
                return Some(node);
            }
        }
        None
    }

    fn node_mut(&mut self, message_id: MessageId) -> Option<&mut OrderedMessage> {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            if node.message_id < message_id {
                cur = node.right.as_deref_mut();
            } else if node.message_id > message_id {
                cur = node.left.as_deref_mut();
            } else {
                return Some(node);
            }
        }
        None
    }

    /// The entry with the greatest identifier strictly below `message_id`.
    fn predecessor(&self, message_id: MessageId) -> Option<&OrderedMessage> {
        let mut cur = self.root.as_deref();
        let mut best = None;
        while let Some(node) = cur {
            if node.message_id < message_id {
                best = Some(node);
                cur = node.right.as_deref();
            } else {
                cur = node.left.as_deref();
            }
        }
        best
    }

    /// The entry with the least identifier strictly above `message_id`.
    fn successor(&self, message_id: MessageId) -> Option<&OrderedMessage> {
        let mut cur = self.root.as_deref();
        let mut best = None;
        while let Some(node) = cur {
            if node.message_id > message_id {
                best = Some(node);
                cur = node.left.as_deref();
            } else {
                cur = node.right.as_deref();
            }
        }
        best
    }

    /// Position a cursor at the entry with the greatest identifier not above
    /// `message_id` — the exact entry when present, otherwise its greatest
    /// predecessor.  The cursor is exhausted when every entry is newer.
    pub fn get_iterator(&self, message_id: MessageId) -> Iter<'_> {
        let mut path = Vec::new();
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            path.push(node);
            if node.message_id < message_id {
                cur = node.right.as_deref();
            } else if node.message_id > message_id {
                cur = node.left.as_deref();
            } else {
                break;
            }
        }
        while path.last().is_some_and(|node| node.message_id > message_id) {
            path.pop();
        }
        Iter { path }
    }

    // ─── Adjacency ───────────────────────────────────────────────────────────

    /// Mark `message_id` as directly following its predecessor.
    ///
    /// The predecessor's `have_next` ends up set either way; if it was set
    /// already, the message inherits `have_next` too, merging the two known
    /// runs.  No-op when the message already has `have_previous`.
    ///
    /// # Panics
    /// Panics if the message or its predecessor is missing from the index.
    pub fn attach_message_to_previous(&mut self, message_id: MessageId, source: &str) {
        assert!(message_id.is_valid());
        let node = self
            .node_mut(message_id)
            .unwrap_or_else(|| panic!("attaching unknown {message_id} from {source}"));
        if node.have_previous {
            return;
        }
        node.have_previous = true;

        let (previous_id, previous_have_next) = match self.predecessor(message_id) {
            Some(previous) => (previous.message_id, previous.have_next),
            None => panic!("nothing before {message_id} from {source}"),
        };
        log::info!("[index] Attach {message_id} to the previous {previous_id} from {source}");
        if previous_have_next {
            self.node_mut(message_id).unwrap().have_next = true;
        } else {
            self.node_mut(previous_id).unwrap().have_next = true;
        }
    }

    /// Mark `message_id` as directly preceding its successor.
    ///
    /// Symmetric to [`attach_message_to_previous`].
    ///
    /// # Panics
    /// Panics if the message or its successor is missing from the index.
    ///
    /// [`attach_message_to_previous`]: OrderedMessages::attach_message_to_previous
    pub fn attach_message_to_next(&mut self, message_id: MessageId, source: &str) {
        assert!(message_id.is_valid());
        let node = self
            .node_mut(message_id)
            .unwrap_or_else(|| panic!("attaching unknown {message_id} from {source}"));
        if node.have_next {
            return;
        }
        node.have_next = true;

        let (next_id, next_have_previous) = match self.successor(message_id) {
            Some(next) => (next.message_id, next.have_previous),
            None => panic!("nothing after {message_id} from {source}"),
        };
        log::info!("[index] Attach {message_id} to the next {next_id} from {source}");
        if next_have_previous {
            self.node_mut(message_id).unwrap().have_previous = true;
        } else {
            self.node_mut(next_id).unwrap().have_previous = true;
        }
    }

    /// Decide how a newly learned message connects to the known history.
    ///
    /// `message_id` must not be in the index yet.  When the tree predecessor
    /// `P` exists and either already has `have_next` or sits at or past a
    /// valid `last_message_id`, the message attaches backwards: `P.have_next`
    /// is raised and the returned `have_next` reports whether it was raised
    /// before.  Otherwise a message that is not yet-unsent may attach
    /// forwards to its tree successor; this path reports `{false, true}` and
    /// mutates nothing.  With no neighbor to attach to, both flags are false.
    pub fn auto_attach_message(
        &mut self,
        message_id: MessageId,
        last_message_id: MessageId,
        source: &str,
    ) -> AttachInfo {
        let previous = self
            .predecessor(message_id)
            .map(|previous| (previous.message_id, previous.have_next));
        if let Some((previous_id, previous_have_next)) = previous {
            if previous_have_next || (last_message_id.is_valid() && previous_id >= last_message_id) {
                if message_id.is_server() && previous_id.is_server() && previous_have_next {
                    match self.successor(message_id) {
                        Some(next) if next.message_id.is_server() => {
                            log::error!(
                                "[index] Attach {message_id} from {source} before {} and after {previous_id}",
                                next.message_id
                            );
                        }
                        Some(_) => {}
                        None => {
                            log::error!(
                                "[index] Supposed to have a next message after {previous_id} from {source}"
                            );
                        }
                    }
                }

                log::info!("[index] Attach {message_id} to the previous {previous_id}");
                self.node_mut(previous_id).unwrap().have_next = true;
                return AttachInfo {
                    have_previous: true,
                    have_next: previous_have_next,
                };
            }
        }

        if !message_id.is_yet_unsent() {
            // With no previous message to continue, the message may still be
            // attached in front of the next one.
            if let Some(next) = self.successor(message_id) {
                assert!(!next.have_previous);
                log::info!("[index] Attach {message_id} to the next {}", next.message_id);
                return AttachInfo {
                    have_previous: false,
                    have_next: true,
                };
            }
        }

        log::info!("[index] Can't auto-attach {message_id}");
        AttachInfo::default()
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// All identifiers not above `max_message_id`, ascending.
    pub fn find_older_messages(&self, max_message_id: MessageId) -> Vec<MessageId> {
        let mut message_ids = Vec::new();
        Self::do_find_older(self.root.as_deref(), max_message_id, &mut message_ids);
        message_ids
    }

    fn do_find_older(node: Option<&OrderedMessage>, max: MessageId, out: &mut Vec<MessageId>) {
        let Some(node) = node else { return };
        Self::do_find_older(node.left.as_deref(), max, out);
        if node.message_id <= max {
            out.push(node.message_id);
            Self::do_find_older(node.right.as_deref(), max, out);
        }
    }

    /// All identifiers strictly above `min_message_id`, ascending.
    pub fn find_newer_messages(&self, min_message_id: MessageId) -> Vec<MessageId> {
        let mut message_ids = Vec::new();
        Self::do_find_newer(self.root.as_deref(), min_message_id, &mut message_ids);
        message_ids
    }

    fn do_find_newer(node: Option<&OrderedMessage>, min: MessageId, out: &mut Vec<MessageId>) {
        let Some(node) = node else { return };
        if node.message_id > min {
            Self::do_find_newer(node.left.as_deref(), min, out);
            out.push(node.message_id);
        }
        Self::do_find_newer(node.right.as_deref(), min, out);
    }

    /// The greatest message whose date is not above `date`, looked up through
    /// the caller-supplied `get_message_date`.
    ///
    /// Dates need not be strictly monotonic in the identifier: a node whose
    /// date is already past the target prunes only its own right-hand
    /// descendants, never a subtree that could still hold a candidate.
    pub fn find_message_by_date(
        &self,
        date: i32,
        get_message_date: impl Fn(MessageId) -> i32,
    ) -> Option<MessageId> {
        Self::do_find_by_date(self.root.as_deref(), date, &get_message_date)
    }

    fn do_find_by_date<F>(node: Option<&OrderedMessage>, date: i32, get_message_date: &F) -> Option<MessageId>
    where
        F: Fn(MessageId) -> i32,
    {
        let node = node?;
        if get_message_date(node.message_id) > date {
            return Self::do_find_by_date(node.left.as_deref(), date, get_message_date);
        }
        Self::do_find_by_date(node.right.as_deref(), date, get_message_date).or(Some(node.message_id))
    }

    /// All messages whose dates fall in `[min_date, max_date]`, ascending by
    /// identifier.
    pub fn find_messages_by_date(
        &self,
        min_date: i32,
        max_date: i32,
        get_message_date: impl Fn(MessageId) -> i32,
    ) -> Vec<MessageId> {
        let mut message_ids = Vec::new();
        Self::do_find_by_date_range(
            self.root.as_deref(),
            min_date,
            max_date,
            &get_message_date,
            &mut message_ids,
        );
        message_ids
    }

    fn do_find_by_date_range<F>(
        node: Option<&OrderedMessage>,
        min_date: i32,
        max_date: i32,
        get_message_date: &F,
        out: &mut Vec<MessageId>,
    ) where
        F: Fn(MessageId) -> i32,
    {
        let Some(node) = node else { return };
        let message_date = get_message_date(node.message_id);
        if message_date >= min_date {
            Self::do_find_by_date_range(node.left.as_deref(), min_date, max_date, get_message_date, out);
            if message_date <= max_date {
                out.push(node.message_id);
            }
        }
        if message_date <= max_date {
            Self::do_find_by_date_range(node.right.as_deref(), min_date, max_date, get_message_date, out);
        }
    }

    /// In-order walk where each direction's descent is gated by its
    /// predicate; the walk dies out as soon as the predicates stop asking
    /// for more.
    pub fn traverse_messages(
        &self,
        mut need_scan_older: impl FnMut(MessageId) -> bool,
        mut need_scan_newer: impl FnMut(MessageId) -> bool,
    ) {
        Self::do_traverse(self.root.as_deref(), &mut need_scan_older, &mut need_scan_newer);
    }

    fn do_traverse<F, G>(node: Option<&OrderedMessage>, need_scan_older: &mut F, need_scan_newer: &mut G)
    where
        F: FnMut(MessageId) -> bool,
        G: FnMut(MessageId) -> bool,
    {
        let Some(node) = node else { return };
        if need_scan_older(node.message_id) {
            Self::do_traverse(node.left.as_deref(), need_scan_older, need_scan_newer);
        }
        if need_scan_newer(node.message_id) {
            Self::do_traverse(node.right.as_deref(), need_scan_older, need_scan_newer);
        }
    }
}

// ─── Iter ─────────────────────────────────────────────────────────────────────

/// A read-only cursor over the index, created by
/// [`OrderedMessages::get_iterator`].
///
/// The cursor records the ancestor chain of its position, so stepping in
/// either direction is plain in-order movement.  Stepping past either end
/// exhausts the cursor for good.
pub struct Iter<'a> {
    path: Vec<&'a OrderedMessage>,
}

impl<'a> Iter<'a> {
    /// The entry under the cursor, or `None` when exhausted.
    pub fn value(&self) -> Option<&'a OrderedMessage> {
        self.path.last().copied()
    }

    /// Step to the in-order predecessor (the next older message).
    pub fn prev(&mut self) {
        let Some(&cur) = self.path.last() else { return };
        if let Some(left) = cur.left.as_deref() {
            self.path.push(left);
            let mut node = left;
            while let Some(right) = node.right.as_deref() {
                self.path.push(right);
                node = right;
            }
        } else {
            let cur_id = cur.message_id;
            self.path.pop();
            while self.path.last().is_some_and(|node| node.message_id > cur_id) {
                self.path.pop();
            }
        }
    }

    /// Step to the in-order successor (the next newer message).
    pub fn next(&mut self) {
        let Some(&cur) = self.path.last() else { return };
        if let Some(right) = cur.right.as_deref() {
            self.path.push(right);
            let mut node = right;
            while let Some(left) = node.left.as_deref() {
                self.path.push(left);
                node = left;
            }
        } else {
            let cur_id = cur.message_id;
            self.path.pop();
            while self.path.last().is_some_and(|node| node.message_id < cur_id) {
                self.path.pop();
            }
        }
    }
}
