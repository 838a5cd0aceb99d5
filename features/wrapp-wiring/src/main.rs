use std::collections::HashMap;

use wrapp_wiring::{
    shared, Component, Descriptor, DynError, Graph, Node, Shared, SlotSpec, Start, Stop,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DynError> {
    let mut graph = Graph::new();
    graph.register([
        Node::new(shared(Greeting::default())).named("en"),
        Node::new(shared(Greeting::default())).named("de"),
        Node::new(shared(Checker::default()))
            .slot("answer", SlotSpec::auto())
            .slot("log", SlotSpec::auto()),
        Node::new(shared(Answer::default())),
        Node::new(shared(Greeter::default()))
            .slot("greetings", SlotSpec::entries([("1", "en"), ("2", "de")])),
    ])?;

    for (name, text) in [("en", "hello"), ("de", "hallo")] {
        if let Some(node) = graph.lookup_named(name) {
            node.assign_value("text", text)?;
        }
    }
    // Unnamed nodes are looked up by their type
    if let Some(answer) = graph.nodes().into_iter().find(|n| n.get::<Answer>().is_some()) {
        answer.assign_value("ans", "42")?;
    }

    graph.populate()?;
    println!("{graph:?}");

    graph.start()?;
    graph.stop()?;
    Ok(())
}

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
struct Log {
    lines: Vec<String>,
}
impl Component for Log {}

#[derive(Default)]
struct Checker {
    answer: Option<Shared<dyn Answerable>>,
    log: Option<Shared<Log>>,
}
impl Start for Checker {
    fn start(&mut self) -> Result<(), DynError> {
        let Some(answer) = &self.answer else {
            return Err("no answer wired".into());
        };
        let answer = answer.read().answer();
        if let Some(log) = &self.log {
            log.write().lines.push(format!("checked {answer}"));
        }
        match answer {
            42 => Ok(()),
            other => Err(format!("expected 42 but got {other}").into()),
        }
    }
}
impl Stop for Checker {
    fn stop(&mut self) -> Result<(), DynError> {
        if let Some(log) = &self.log {
            println!("{}", log.read().lines.join("\n"));
        }
        Ok(())
    }
}
impl Component for Checker {
    fn describe(d: &mut Descriptor<Self>) {
        d.capability("answer", |s| &mut s.answer)
            .reference("log", |s| &mut s.log)
            .starts()
            .stops();
    }
}

#[derive(Default)]
struct Greeting {
    text: String,
}
impl Component for Greeting {
    fn describe(d: &mut Descriptor<Self>) {
        d.value("text", |s| &mut s.text);
    }
}

#[derive(Default)]
struct Greeter {
    greetings: HashMap<u8, Shared<Greeting>>,
}
impl Start for Greeter {
    fn start(&mut self) -> Result<(), DynError> {
        let mut keys: Vec<_> = self.greetings.keys().copied().collect();
        keys.sort();
        for key in keys {
            println!("{key}: {}", self.greetings[&key].read().text);
        }
        Ok(())
    }
}
impl Component for Greeter {
    fn describe(d: &mut Descriptor<Self>) {
        d.map("greetings", |s| &mut s.greetings).starts();
    }
}
