use std::{collections::HashMap, sync::Arc};

use wrapp_wiring::{
    shared, Component, Descriptor, Graph, Node, ResolveError, Shared, SlotSpec,
};

pub trait Answerable: Send + Sync {
    fn answer(&self) -> i64;
}

#[derive(Default)]
struct Answer {
    ans: i64,
}
impl Answerable for Answer {
    fn answer(&self) -> i64 {
        self.ans
    }
}
impl Component for Answer {
    fn describe(d: &mut Descriptor<Self>) {
        d.value("ans", |s| &mut s.ans)
            .implements::<dyn Answerable>(|answer| answer);
    }
}

#[derive(Default)]
struct OtherAnswer;
impl Answerable for OtherAnswer {
    fn answer(&self) -> i64 {
        7
    }
}
impl Component for OtherAnswer {
    fn describe(d: &mut Descriptor<Self>) {
        d.implements::<dyn Answerable>(|answer| answer);
    }
}

#[derive(Default)]
struct Asker {
    answer: Option<Shared<dyn Answerable>>,
}
impl Component for Asker {
    fn describe(d: &mut Descriptor<Self>) {
        d.capability("answer", |s| &mut s.answer);
    }
}

#[derive(Default)]
struct Leaf {
    id: i64,
}
impl Component for Leaf {
    fn describe(d: &mut Descriptor<Self>) {
        d.value("id", |s| &mut s.id);
    }
}

#[derive(Default)]
struct Middle {
    leaf: Option<Shared<Leaf>>,
}
impl Component for Middle {
    fn describe(d: &mut Descriptor<Self>) {
        d.reference("leaf", |s| &mut s.leaf);
    }
}

#[derive(Default)]
struct Top {
    middle: Option<Shared<Middle>>,
    leaf: Option<Shared<Leaf>>,
}
impl Component for Top {
    fn describe(d: &mut Descriptor<Self>) {
        d.reference("middle", |s| &mut s.middle)
            .reference("leaf", |s| &mut s.leaf);
    }
}

fn middle_with_auto_leaf() -> Node {
    Node::new(shared(Middle::default())).slot("leaf", SlotSpec::auto())
}

#[test]
fn creates_missing_references_and_shares_them() {
    let top = shared(Top::default());
    let mut graph = Graph::new();
    graph
        .register([Node::new(top.clone())
            .slot("middle", SlotSpec::auto())
            .slot("leaf", SlotSpec::auto())])
        .unwrap();
    graph.populate().unwrap();

    // Top, plus a created Middle and Leaf
    assert_eq!(graph.len(), 3);
    let top = top.read();
    let leaf = top.leaf.clone().unwrap();
    let middle = top.middle.clone().unwrap();

    // The created middle has no spec for its own leaf slot, so it stays empty
    assert!(middle.read().leaf.is_none());
    assert!(graph
        .nodes()
        .into_iter()
        .filter(|node| node.is_created())
        .all(|node| node.name().is_none()));
    assert!(graph
        .nodes()
        .into_iter()
        .any(|node| node.get::<Leaf>().is_some_and(|l| Arc::ptr_eq(&l, &leaf))));
}

#[test]
fn existing_unnamed_nodes_are_reused() {
    let leaf = shared(Leaf { id: 3 });
    let middle = shared(Middle::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(middle.clone()).slot("leaf", SlotSpec::auto()),
            Node::new(leaf.clone()),
        ])
        .unwrap();
    graph.populate().unwrap();

    assert_eq!(graph.len(), 2);
    let wired = middle.read().leaf.clone().unwrap();
    assert!(Arc::ptr_eq(&wired, &leaf));
    assert_eq!(wired.read().id, 3);
}

#[test]
fn never_overwrites_set_slots() {
    let preset = shared(Leaf { id: 1 });
    let middle = shared(Middle {
        leaf: Some(preset.clone()),
    });
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(middle.clone()).slot("leaf", SlotSpec::auto()),
            Node::new(shared(Leaf { id: 2 })),
        ])
        .unwrap();
    graph.populate().unwrap();

    let wired = middle.read().leaf.clone().unwrap();
    assert!(Arc::ptr_eq(&wired, &preset));
    assert!(graph.nodes().iter().all(|node| node.dependencies().is_empty()));
}

#[test]
fn complete_nodes_are_skipped() {
    let middle = shared(Middle::default());
    let mut graph = Graph::new();
    graph
        .register([Node::new(middle.clone())
            .slot("leaf", SlotSpec::auto())
            .complete()])
        .unwrap();
    graph.populate().unwrap();

    assert!(middle.read().leaf.is_none());
    assert_eq!(graph.len(), 1);
}

#[test]
fn populating_twice_changes_nothing() {
    let mut graph = Graph::new();
    graph.register([middle_with_auto_leaf()]).unwrap();
    graph.populate().unwrap();
    let len = graph.len();

    graph.populate().unwrap();
    assert_eq!(graph.len(), len);
    assert!(graph.nodes().iter().all(|node| node.is_complete()));
    let edges: usize = graph.nodes().iter().map(|n| n.dependencies().len()).sum();
    assert_eq!(edges, 1);
}

#[test]
fn wires_named_nodes() {
    let leaf = shared(Leaf { id: 9 });
    let middle = shared(Middle::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(leaf.clone()).named("special"),
            Node::new(middle.clone()).slot("leaf", SlotSpec::named("special")),
        ])
        .unwrap();
    graph.populate().unwrap();

    assert!(Arc::ptr_eq(&middle.read().leaf.clone().unwrap(), &leaf));
    // Nothing was created, the named leaf is not an unnamed candidate
    assert_eq!(graph.len(), 2);
}

#[test]
fn reports_missing_named_nodes() {
    let mut graph = Graph::new();
    graph
        .register([Node::new(shared(Middle::default())).slot("leaf", SlotSpec::named("foo"))])
        .unwrap();

    let err = graph.populate().unwrap_err();
    assert!(matches!(&err, ResolveError::MissingNamed { name, slot, .. } if name == "foo" && slot == "leaf"));
    let message = err.to_string();
    assert!(message.contains("foo"));
    assert!(message.contains("Middle"));
}

#[test]
fn reports_type_mismatches() {
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Answer::default())).named("wrong"),
            Node::new(shared(Middle::default())).slot("leaf", SlotSpec::named("wrong")),
        ])
        .unwrap();

    let err = graph.populate().unwrap_err();
    let message = err.to_string();
    let ResolveError::TypeMismatch {
        name,
        actual,
        expected,
        ..
    } = err
    else {
        panic!("expected a type mismatch, got {message}");
    };
    assert_eq!(name, "wrong");
    assert!(actual.type_name.ends_with("Answer"));
    assert!(expected.type_name.ends_with("Leaf"));
}

#[derive(Default)]
struct Vault {
    key: String,
}
impl Component for Vault {
    fn describe(d: &mut Descriptor<Self>) {
        d.value("key", |s| &mut s.key).private("secret");
    }
}

#[test]
fn refuses_private_slots() {
    let mut graph = Graph::new();
    graph
        .register([
            Node::constant("x".to_string()).named("secret"),
            Node::new(shared(Vault::default())).slot("secret", SlotSpec::named("secret")),
        ])
        .unwrap();

    let err = graph.populate().unwrap_err();
    assert!(matches!(err, ResolveError::PrivateSlot { slot, .. } if slot == "secret"));
}

#[test]
fn refuses_auto_wiring_into_values() {
    let mut graph = Graph::new();
    graph
        .register([Node::new(shared(Vault::default())).slot("key", SlotSpec::auto())])
        .unwrap();

    let err = graph.populate().unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedSlot { slot, .. } if slot == "key"));
}

#[test]
fn fills_values_from_named_constants() {
    let vault = shared(Vault::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::constant("open sesame".to_string()).named("password"),
            Node::new(vault.clone()).slot("key", SlotSpec::named("password")),
        ])
        .unwrap();
    graph.populate().unwrap();

    assert_eq!(vault.read().key, "open sesame");
}

#[test]
fn matches_capabilities_to_the_single_candidate() {
    let asker = shared(Asker::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(asker.clone()).slot("answer", SlotSpec::auto()),
            Node::new(shared(Answer { ans: 42 })),
            // Named nodes never take part in capability matching
            Node::new(shared(OtherAnswer)).named("other"),
        ])
        .unwrap();
    graph.populate().unwrap();

    let answer = asker.read().answer.clone().unwrap();
    assert_eq!(answer.read().answer(), 42);
}

#[test]
fn capability_without_candidate_fails() {
    let mut graph = Graph::new();
    graph
        .register([Node::new(shared(Asker::default())).slot("answer", SlotSpec::auto())])
        .unwrap();

    let err = graph.populate().unwrap_err();
    assert!(matches!(err, ResolveError::NoCandidate { slot, .. } if slot == "answer"));
}

#[test]
fn capability_with_two_candidates_is_ambiguous() {
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Asker::default())).slot("answer", SlotSpec::auto()),
            Node::new(shared(Answer::default())),
            Node::new(shared(OtherAnswer)),
        ])
        .unwrap();

    let err = graph.populate().unwrap_err();
    let message = err.to_string();
    let ResolveError::Ambiguous { first, second, .. } = err else {
        panic!("expected ambiguity, got {message}");
    };
    assert!(first.ends_with("Answer"));
    assert!(second.ends_with("OtherAnswer"));
    assert!(message.starts_with("found two assignable nodes for slot 'answer'"));
}

#[derive(Default)]
struct Needy {
    asker: Option<Shared<Asker>>,
}
impl Component for Needy {
    fn describe(d: &mut Descriptor<Self>) {
        d.reference("asker", |s| &mut s.asker);
    }
}

#[test]
fn named_capability_slot_takes_the_named_node() {
    let asker = shared(Asker::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(asker.clone()).slot("answer", SlotSpec::named("other")),
            Node::new(shared(Answer::default())),
            Node::new(shared(OtherAnswer)).named("other"),
        ])
        .unwrap();
    graph.populate().unwrap();

    assert_eq!(asker.read().answer.clone().unwrap().read().answer(), 7);
}

#[test]
fn created_nodes_get_no_specs() {
    let needy = shared(Needy::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(needy.clone()).slot("asker", SlotSpec::auto()),
            Node::new(shared(Answer::default())),
        ])
        .unwrap();
    graph.populate().unwrap();

    // The created asker had no spec, so its capability slot is left alone
    let asker = needy.read().asker.clone().unwrap();
    assert!(asker.read().answer.is_none());
}

#[derive(Default)]
struct Chorus {
    voices: Vec<Shared<dyn Answerable>>,
}
impl Component for Chorus {
    fn describe(d: &mut Descriptor<Self>) {
        d.sequence("voices", |s| &mut s.voices);
    }
}

#[test]
fn builds_sequences_in_declared_order() {
    let chorus = shared(Chorus::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Answer { ans: 1 })).named("one"),
            Node::new(shared(Answer { ans: 2 })).named("two"),
            Node::new(shared(OtherAnswer)).named("seven"),
            Node::new(chorus.clone()).slot("voices", SlotSpec::sequence(["two", "seven", "one"])),
        ])
        .unwrap();
    graph.populate().unwrap();

    let answers: Vec<i64> = chorus
        .read()
        .voices
        .iter()
        .map(|voice| voice.read().answer())
        .collect();
    assert_eq!(answers, [2, 7, 1]);

    let chorus = graph
        .nodes()
        .into_iter()
        .find(|node| node.get::<Chorus>().is_some())
        .unwrap();
    let slots: Vec<&str> = chorus.dependencies().iter().map(|d| d.slot.as_str()).collect();
    assert_eq!(slots, ["voices"; 3]);
}

#[test]
fn sequence_elements_must_fit() {
    let chorus = shared(Chorus::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Answer { ans: 1 })).named("one"),
            Node::new(shared(Leaf::default())).named("leaf"),
            Node::new(chorus.clone()).slot("voices", SlotSpec::sequence(["one", "leaf"])),
        ])
        .unwrap();

    let err = graph.populate().unwrap_err();
    assert!(matches!(err, ResolveError::TypeMismatch { name, .. } if name == "leaf"));
    // Nothing was assigned
    assert!(chorus.read().voices.is_empty());
}

#[derive(Default)]
struct Index {
    by_id: HashMap<u32, Shared<Leaf>>,
}
impl Component for Index {
    fn describe(d: &mut Descriptor<Self>) {
        d.map("by_id", |s| &mut s.by_id);
    }
}

#[test]
fn builds_maps_with_coerced_keys() {
    let index = shared(Index::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Leaf { id: 10 })).named("a"),
            Node::new(shared(Leaf { id: 20 })).named("b"),
            Node::new(index.clone()).slot("by_id", SlotSpec::entries([("1", "a"), ("2", "b")])),
        ])
        .unwrap();
    graph.populate().unwrap();

    let index = index.read();
    assert_eq!(index.by_id.len(), 2);
    assert_eq!(index.by_id[&1].read().id, 10);
    assert_eq!(index.by_id[&2].read().id, 20);
}

#[test]
fn rejects_keys_that_do_not_convert() {
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(shared(Index::default())).slot("by_id", SlotSpec::entries([("one", "missing")])),
        ])
        .unwrap();

    // The key is checked before the node is looked up
    let err = graph.populate().unwrap_err();
    assert!(matches!(err, ResolveError::KeyCoercion { key, .. } if key == "one"));
}

#[test]
fn fills_sequences_from_named_constants() {
    let voices: Vec<Shared<dyn Answerable>> = vec![shared(Answer { ans: 5 }), shared(OtherAnswer)];
    let chorus = shared(Chorus::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::constant(voices).named("voices"),
            Node::new(chorus.clone()).slot("voices", SlotSpec::named("voices")),
        ])
        .unwrap();
    graph.populate().unwrap();

    let answers: Vec<i64> = chorus.read().voices.iter().map(|v| v.read().answer()).collect();
    assert_eq!(answers, [5, 7]);
}

#[derive(Default)]
struct Playlist {
    tracks: Vec<String>,
}
impl Component for Playlist {
    fn describe(d: &mut Descriptor<Self>) {
        d.values("tracks", |s| &mut s.tracks);
    }
}

#[test]
fn fills_value_lists_from_named_constants() {
    let playlist = shared(Playlist::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::constant(vec!["intro".to_string(), "outro".to_string()]).named("tracks"),
            Node::new(playlist.clone()).slot("tracks", SlotSpec::named("tracks")),
        ])
        .unwrap();
    graph.populate().unwrap();

    assert_eq!(playlist.read().tracks, ["intro", "outro"]);
}

#[derive(Default)]
struct Provider {
    answer: Option<Shared<Answer>>,
}
impl Component for Provider {
    fn describe(d: &mut Descriptor<Self>) {
        d.reference("answer", |s| &mut s.answer);
    }
}

#[test]
fn capabilities_see_nodes_created_in_the_first_pass() {
    let asker = shared(Asker::default());
    let provider = shared(Provider::default());
    let mut graph = Graph::new();
    graph
        .register([
            Node::new(asker.clone()).slot("answer", SlotSpec::auto()),
            Node::new(provider.clone()).slot("answer", SlotSpec::auto()),
        ])
        .unwrap();
    graph.populate().unwrap();

    let created = provider.read().answer.clone().unwrap();
    let wired = asker.read().answer.clone().unwrap();
    assert_eq!(
        Arc::as_ptr(&wired) as *const (),
        Arc::as_ptr(&created) as *const ()
    );

    let asker = graph
        .nodes()
        .into_iter()
        .find(|node| node.get::<Asker>().is_some())
        .unwrap();
    let [edge] = asker.dependencies() else {
        panic!("expected a single edge, got {:?}", asker.dependencies());
    };
    assert_eq!(edge.slot, "answer");
    let target = graph.node(edge.target).unwrap();
    assert!(target.is_created());
    assert!(target
        .get::<Answer>()
        .is_some_and(|answer| Arc::ptr_eq(&answer, &created)));
}
