use std::collections::BTreeMap;

use evalgate_core::{
    default_evaluators, Eval, GeneratedOutput, RegressionDetector, RuleSet, Sample,
};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    let dataset = vec![
        Sample::new("s1", "the cat sat", json!("the cat sat on the mat")),
        Sample::new("s2", "reply with name and age", json!({"name": "x", "age": 3})),
    ];
    let outputs = vec![
        GeneratedOutput::new("s1", json!("the cat sat on the mat")),
        GeneratedOutput::new("s2", json!(r#"{"name": "x", "age": 4}"#)),
    ];

    let report = Eval::builder()
        .dataset(dataset)
        .outputs(outputs)
        .evaluators(default_evaluators())
        .build()?
        .run()?;
    println!("{}", report.summary_table());

    let policy = BTreeMap::from([(
        "faithfulness".to_string(),
        RuleSet { min_score: Some(0.8), max_delta: None },
    )]);
    let verdict = RegressionDetector::new(policy).compare(&report.aggregates, &report.aggregates);
    println!("Regression status: {}", verdict.status);
    for detail in &verdict.details {
        println!("⚠ {detail}");
    }

    Ok(())
}
