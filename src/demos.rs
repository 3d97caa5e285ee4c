use crate::config::TracerConfig;
use crate::core::node::Node;
use crate::core::value::Value;
use crate::runtime::registry::Registry;
use crate::runtime::tracer::Tracer;
use crate::ui::widgets::{Code, Terminal};
use serde_json::json;

const LARGEST: &str = "
int largest = a[0];
for (int i = 1; i < a.length; i++)
{
   if (a[i] > largest)
   {
      largest = a[i];
   }
}
System.out.println(largest);
";

/// The built-in exercises.
pub fn registry(config: &TracerConfig) -> Registry {
    let mut registry = Registry::new();
    registry.register(Some("linked-list"), linked_list, config.clone());
    registry.register(Some("largest"), largest, config.clone());
    registry
}

fn stored_values(data: &Option<serde_json::Value>, key: &str) -> Option<Vec<i64>> {
    data.as_ref()
        .and_then(|data| data.get(key))
        .and_then(|values| serde_json::from_value(values.clone()).ok())
}

/// Inserts a node at the front of a linked list, then unlinks the tail.
pub async fn linked_list(sim: Tracer, data: Option<serde_json::Value>) {
    let values = stored_values(&data, "values").unwrap_or_else(|| sim.rand_int_array(3, 1, 9));
    let inserted = data
        .as_ref()
        .and_then(|data| data.get("inserted"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or_else(|| sim.rand_int(10, 99));
    sim.start(
        json!({ "values": values, "inserted": inserted }),
        "Insert a node at the front of the list.",
    )
    .await;

    let main = Node::frame("main");
    sim.add(0.0, 0.0, &main);
    let nodes: Vec<Node> = values
        .iter()
        .enumerate()
        .map(|(position, value)| {
            let node = Node::object().titled("Node").drop_history_for("next");
            node.set("data", *value);
            node.set("next", Value::Null);
            sim.add(4.0 + 4.0 * position as f64, 0.0, &node);
            node
        })
        .collect();
    for pair in nodes.windows(2) {
        pair[0].set("next", &pair[1]);
    }
    main.set("head", nodes.first());
    sim.add_buttons(&["Insert", "Remove"]);
    sim.click("Insert", Some("Click the operation that adds a node.")).await;

    let node = Node::object().titled("Node").drop_history_for("next");
    node.set("data", inserted);
    node.set("next", Value::Null);
    sim.add(4.0, 3.0, &node);
    main.set("n", &node);
    sim.pause("A new node was allocated.").await;

    if let Some(first) = nodes.first() {
        sim.set(&node.path("next"), first, Some("Point the new node to the first node."))
            .await;
    }
    sim.set(&main.path("head"), &node, Some("Make head point to the new node."))
        .await;
    if let Some(first) = nodes.first() {
        sim.ask(first, Some("Select the node that follows the new node.")).await;
    }
    sim.ask(nodes.len() + 1, Some("How many nodes does the list have now?"))
        .await;

    if let [.., before, last] = nodes.as_slice() {
        sim.set(&before.path("next"), Value::Null, Some("Unlink the last node."))
            .await;
        sim.remove(last);
        sim.next("The last node is gone.").await;
    }
}

/// Finds the largest array element, following the code line by line.
pub async fn largest(sim: Tracer, data: Option<serde_json::Value>) {
    let values = stored_values(&data, "values").unwrap_or_else(|| sim.rand_int_array(5, 1, 50));
    sim.start(json!({ "values": values }), "Trace the search for the largest element.")
        .await;

    let code = Code::new(LARGEST);
    sim.add(0.0, 0.0, &code);
    let array = Node::array();
    for value in &values {
        array.push(*value);
    }
    let main = Node::frame("main").drop_history_for("i");
    main.set("a", &array);
    main.set("largest", Value::empty());
    sim.add(8.0, 0.0, &main);
    let output = Terminal::new();
    sim.add(8.0, 6.0, &output);

    let Some(first) = values.first().copied() else {
        return;
    };
    sim.set(&main.path("largest"), first, Some("Initialize largest.")).await;
    let mut largest = first;
    for (i, value) in values.iter().copied().enumerate().skip(1) {
        code.go(Some(2));
        main.set("i", i);
        sim.perform(code.ask(&[4], Some("Which line is executed next?")))
            .await;
        if value > largest {
            sim.perform(code.ask(&[6], None)).await;
            sim.set(&main.path("largest"), value, None).await;
            largest = value;
        }
    }
    sim.perform(code.ask(&[9], None)).await;
    sim.perform(output.ask(Some(&largest.to_string()))).await;
    sim.pause("Done.").await;
}

#[cfg(test)]
mod tests {
    use super::{largest, linked_list, registry};
    use crate::config::{Language, TracerConfig};
    use crate::runtime::routine::{Algorithm, Routine};
    use crate::runtime::step::{Action, StepKind};
    use crate::runtime::tracer::Tracer;

    fn kinds(algorithm: &dyn Algorithm, data: Option<serde_json::Value>) -> Vec<StepKind> {
        let mut routine = Routine::new(algorithm, Tracer::silent(Language::Java, 5), data);
        let mut kinds = Vec::new();
        let mut result = Default::default();
        while let Some(mut step) = routine.next(result).expect("well-formed steps") {
            kinds.push(step.kind());
            result = step.natural_result();
            step.complete(&result);
        }
        kinds
    }

    #[test]
    fn linked_list_steps() {
        let data = serde_json::json!({ "values": [1, 2, 3], "inserted": 42 });
        assert_eq!(
            kinds(&linked_list, Some(data)),
            vec![
                StepKind::Start,
                StepKind::Click,
                StepKind::Pause,
                StepKind::Connect,
                StepKind::Connect,
                StepKind::Select,
                StepKind::Input,
                StepKind::Input,
                StepKind::Next,
            ]
        );
    }

    #[test]
    fn largest_asks_for_updates_only_when_larger() {
        let data = serde_json::json!({ "values": [3, 7, 5] });
        let steps = kinds(&largest, Some(data));
        let inputs = steps.iter().filter(|kind| **kind == StepKind::Input).count();
        // largest = 3, largest = 7, printed output
        assert_eq!(inputs, 3);
        assert_eq!(steps.first(), Some(&StepKind::Start));
        assert_eq!(steps.last(), Some(&StepKind::Pause));
    }

    #[test]
    fn start_state_records_generated_data() {
        let mut routine = Routine::new(&largest, Tracer::silent(Language::Java, 9), None);
        let step = routine
            .next(Default::default())
            .expect("ok")
            .expect("start");
        let Action::Start { state } = &step.action else {
            panic!("first step must be start");
        };
        assert_eq!(state["values"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn registers_both_exercises() {
        let registry = registry(&TracerConfig::default());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["linked-list", "largest"]);
    }
}
