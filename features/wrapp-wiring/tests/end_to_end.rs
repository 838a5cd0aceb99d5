use std::sync::Arc;

use wrapp_wiring::{
    shared, Component, Descriptor, DynError, Graph, GraphError, Hook, LifecycleError, Node,
    ResolveError, Shared, SlotSpec, Start,
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
struct Checker {
    answer: Option<Shared<dyn Answerable>>,
}
impl Start for Checker {
    fn start(&mut self) -> Result<(), DynError> {
        let answer = self.answer.as_ref().ok_or("answer was never wired")?;
        match answer.read().answer() {
            666 => Ok(()),
            other => Err(format!("{other} is not the answer").into()),
        }
    }
}
impl Component for Checker {
    fn describe(d: &mut Descriptor<Self>) {
        d.capability("answer", |s| &mut s.answer).starts();
    }
}

fn wired(ans: i64) -> (Graph, Shared<Answer>, Shared<Checker>) {
    let answer = shared(Answer { ans });
    let checker = shared(Checker::default());

    let mut graph = Graph::new();
    graph
        .register([
            Node::new(answer.clone()).named("test"),
            Node::new(checker.clone())
                .named("checker")
                .slot("answer", SlotSpec::named("test")),
        ])
        .unwrap();
    graph.populate().unwrap();
    (graph, answer, checker)
}

#[test]
fn checker_receives_the_exact_named_instance() {
    let (_, answer, checker) = wired(0);

    let wired = checker.read().answer.clone().unwrap();
    answer.write().ans = 12;
    assert_eq!(wired.read().answer(), 12);

    // Same allocation behind the capability handle
    let wired = Arc::as_ptr(&wired) as *const ();
    assert_eq!(wired, Arc::as_ptr(&answer) as *const ());
}

#[test]
fn starts_with_the_right_answer() {
    let (mut graph, _, _) = wired(666);
    graph.start().unwrap();

    let started: Vec<_> = graph.started().filter_map(|node| node.name()).collect();
    assert_eq!(started, ["checker"]);
}

#[test]
fn fails_to_start_with_any_other_answer() {
    let (mut graph, _, _) = wired(42);

    let err = graph.start().unwrap_err();
    let LifecycleError::Hook { hook, node, source } = err else {
        panic!("expected a hook failure");
    };
    assert_eq!(hook, Hook::Start);
    assert!(node.ends_with("named checker"));
    assert_eq!(source.to_string(), "42 is not the answer");
    assert_eq!(graph.started().count(), 0);
}

fn run(ans: i64, target: &str) -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    graph.register([
        Node::new(shared(Answer { ans })).named("test"),
        Node::new(shared(Checker::default())).slot("answer", SlotSpec::named(target)),
    ])?;
    graph.populate()?;
    graph.start()?;
    Ok(graph)
}

#[test]
fn every_stage_reports_through_one_error_type() {
    assert!(run(666, "test").is_ok());
    assert!(matches!(
        run(666, "nope"),
        Err(GraphError::Resolve(ResolveError::MissingNamed { .. }))
    ));
    assert!(matches!(
        run(1, "test"),
        Err(GraphError::Lifecycle(LifecycleError::Hook { .. }))
    ));
}
