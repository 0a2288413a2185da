use tether_index::{AttachInfo, MessageId, OrderedMessages};

fn server(id: i32) -> MessageId {
    MessageId::from_server_id(id)
}

fn ids(server_ids: &[i32]) -> Vec<MessageId> {
    server_ids.iter().map(|&id| server(id)).collect()
}

fn filled(server_ids: &[i32]) -> OrderedMessages {
    let mut messages = OrderedMessages::new();
    for &id in server_ids {
        messages.insert(server(id));
    }
    messages
}

// ── Membership and ranges ─────────────────────────────────────────────────────

#[test]
fn out_of_order_inserts_read_back_sorted() {
    let mut messages = filled(&[5, 2, 8, 1, 3, 7, 9]);

    assert_eq!(messages.find_older_messages(server(10)), ids(&[1, 2, 3, 5, 7, 8, 9]));

    messages.erase(server(5));
    assert_eq!(messages.find_older_messages(server(10)), ids(&[1, 2, 3, 7, 8, 9]));
}

#[test]
fn older_and_newer_partition_the_set() {
    let messages = filled(&[1, 2, 3, 5, 7, 8, 9]);
    let all = messages.find_older_messages(MessageId::MAX);

    for &pivot in &[0, 1, 4, 5, 9, 10] {
        let older = messages.find_older_messages(server(pivot));
        let newer = messages.find_newer_messages(server(pivot));

        let mut merged = older.clone();
        merged.extend_from_slice(&newer);
        assert_eq!(merged, all, "pivot {pivot} must split without loss");
        assert!(older.iter().all(|&id| id <= server(pivot)));
        assert!(newer.iter().all(|&id| id > server(pivot)));
    }
}

#[test]
fn range_bounds_are_inclusive_below_exclusive_above() {
    let messages = filled(&[1, 2, 3]);
    assert_eq!(messages.find_older_messages(server(2)), ids(&[1, 2]));
    assert_eq!(messages.find_newer_messages(server(2)), ids(&[3]));
}

// ── Date queries ──────────────────────────────────────────────────────────────

fn date_of(message_id: MessageId) -> i32 {
    // 1 → 100, 2 → 200, 3 → 300
    (message_id.get() >> MessageId::SERVER_ID_SHIFT) as i32 * 100
}

#[test]
fn date_lookup_returns_the_greatest_message_not_past_the_target() {
    let messages = filled(&[1, 2, 3]);

    assert_eq!(messages.find_message_by_date(250, date_of), Some(server(2)));
    assert_eq!(messages.find_message_by_date(300, date_of), Some(server(3)));
    assert_eq!(messages.find_message_by_date(99, date_of), None);
}

#[test]
fn date_range_yields_ascending_hits_only() {
    let messages = filled(&[1, 2, 3]);

    assert_eq!(messages.find_messages_by_date(150, 250, date_of), ids(&[2]));
    assert_eq!(messages.find_messages_by_date(100, 300, date_of), ids(&[1, 2, 3]));
    assert_eq!(messages.find_messages_by_date(301, 400, date_of), ids(&[]));
}

#[test]
fn date_lookup_is_monotonic_over_every_target() {
    let messages = filled(&[1, 2, 3, 5, 7, 8, 9]);
    for target in 0..1000 {
        let hit = messages.find_message_by_date(target, date_of);
        let expected = messages
            .find_older_messages(MessageId::MAX)
            .into_iter()
            .filter(|&id| date_of(id) <= target)
            .next_back();
        assert_eq!(hit, expected, "target date {target}");
    }
}

// ── Adjacency ─────────────────────────────────────────────────────────────────

fn flags(messages: &OrderedMessages, id: MessageId) -> (bool, bool) {
    let it = messages.get_iterator(id);
    let node = it.value().expect("entry present");
    assert_eq!(node.message_id, id);
    (node.have_previous, node.have_next)
}

#[test]
fn attach_to_previous_links_both_sides() {
    let mut messages = filled(&[10, 20, 30]);

    messages.attach_message_to_previous(server(20), "test");
    assert_eq!(flags(&messages, server(10)), (false, true));
    assert_eq!(flags(&messages, server(20)), (true, false));

    messages.attach_message_to_previous(server(30), "test");
    assert_eq!(flags(&messages, server(20)), (true, true));
    // 20 had no `have_next` before the call, so 30 does not inherit one.
    assert_eq!(flags(&messages, server(30)), (true, false));
}

#[test]
fn attach_to_next_links_both_sides() {
    let mut messages = filled(&[10, 20]);

    messages.attach_message_to_next(server(10), "test");
    assert_eq!(flags(&messages, server(10)), (false, true));
    assert_eq!(flags(&messages, server(20)), (true, false));
}

#[test]
fn attach_inherits_a_preset_have_next() {
    let mut messages = filled(&[10, 20]);

    // Raise 20's `have_next` first.
    messages.auto_attach_message(server(25), server(20), "seed");
    assert_eq!(flags(&messages, server(20)), (false, true));

    // 30 attaches backwards and inherits the raised flag.
    messages.insert(server(30));
    messages.attach_message_to_previous(server(30), "test");
    assert_eq!(flags(&messages, server(30)), (true, true));
    assert_eq!(flags(&messages, server(20)), (false, true));
}

#[test]
fn attach_is_idempotent() {
    let mut messages = filled(&[10, 20]);
    messages.attach_message_to_previous(server(20), "first");
    messages.attach_message_to_previous(server(20), "second");
    assert_eq!(flags(&messages, server(10)), (false, true));
    assert_eq!(flags(&messages, server(20)), (true, false));
}

#[test]
#[should_panic(expected = "nothing before")]
fn attaching_the_minimum_backwards_panics() {
    let mut messages = filled(&[10]);
    messages.attach_message_to_previous(server(10), "test");
}

#[test]
fn auto_attach_continues_a_known_run() {
    let mut messages = filled(&[10, 20]);

    // 20 is the dialog's last message, so 30 attaches behind it.
    let info = messages.auto_attach_message(server(30), server(20), "test");
    assert_eq!(info, AttachInfo { have_previous: true, have_next: false });
    assert_eq!(flags(&messages, server(20)), (false, true));

    // A later newcomer behind 20 sees the raised flag reported back.
    messages.insert(server(30));
    let info = messages.auto_attach_message(server(25), MessageId::default(), "test");
    assert_eq!(info, AttachInfo { have_previous: true, have_next: true });
}

#[test]
fn auto_attach_honors_last_message_id() {
    let mut messages = filled(&[10]);

    // Predecessor has no `have_next`, but it is the dialog's last message.
    let info = messages.auto_attach_message(server(15), server(10), "test");
    assert_eq!(info, AttachInfo { have_previous: true, have_next: false });
    assert_eq!(flags(&messages, server(10)), (false, true));
}

#[test]
fn auto_attach_forward_path_reports_without_mutating() {
    let mut messages = filled(&[50]);

    let info = messages.auto_attach_message(server(40), MessageId::default(), "test");
    assert_eq!(info, AttachInfo { have_previous: false, have_next: true });
    // The successor is reported but deliberately left untouched.
    assert_eq!(flags(&messages, server(50)), (false, false));
}

#[test]
fn auto_attach_skips_the_forward_path_for_unsent_messages() {
    let mut messages = filled(&[50]);

    let info = messages.auto_attach_message(MessageId::yet_unsent(40), MessageId::default(), "test");
    assert_eq!(info, AttachInfo { have_previous: false, have_next: false });
}

#[test]
fn auto_attach_with_no_neighbors_reports_nothing() {
    let mut messages = OrderedMessages::new();
    let info = messages.auto_attach_message(server(1), MessageId::default(), "test");
    assert_eq!(info, AttachInfo { have_previous: false, have_next: false });
}

// ── Traversal ─────────────────────────────────────────────────────────────────

#[test]
fn traverse_is_gated_by_both_predicates() {
    let messages = filled(&[1, 2, 3, 5, 7, 8, 9]);

    let mut older_probes = Vec::new();
    let mut newer_probes = Vec::new();
    messages.traverse_messages(
        |id| {
            older_probes.push(id);
            id > server(3)
        },
        |id| {
            newer_probes.push(id);
            id < server(7)
        },
    );

    // Every probed identifier was reachable only through approving ancestors.
    assert!(!older_probes.is_empty());
    assert!(!newer_probes.is_empty());
    for id in older_probes.iter().chain(newer_probes.iter()) {
        assert!(messages.find_older_messages(MessageId::MAX).contains(id));
    }
}

#[test]
fn traverse_with_closed_gates_only_probes_the_root() {
    let messages = filled(&[1, 2, 3]);
    let mut older_probes = 0;
    let mut newer_probes = 0;
    messages.traverse_messages(
        |_| {
            older_probes += 1;
            false
        },
        |_| {
            newer_probes += 1;
            false
        },
    );
    assert_eq!(older_probes + newer_probes, 2, "one probe per direction, root only");
}

// ── Iterator contract ─────────────────────────────────────────────────────────

#[test]
fn iterator_covers_the_whole_set_in_order() {
    let messages = filled(&[5, 2, 8, 1, 3, 7, 9]);
    let expected = ids(&[1, 2, 3, 5, 7, 8, 9]);

    let mut it = messages.get_iterator(MessageId::MAX);
    let mut collected = Vec::new();
    while let Some(node) = it.value() {
        collected.push(node.message_id);
        it.prev();
    }
    collected.reverse();
    assert_eq!(collected, expected);
}
