use tracing_subscriber::EnvFilter;
use wd_optimizer::{Checkpoint, Learner, SearchConfig, SubrangeSearch};
use wd_types::{Configuration, FullRange, ParameterValue};

/// Synthetic learner whose accuracy peaks at lr = 0.003, hidden = 128 and
/// the `tanh` activation, improving slowly with more epochs.
struct ToyLearner;

impl ToyLearner {
    fn numeric(config: &Configuration, param: &str) -> anyhow::Result<f64> {
        match config.get(param) {
            Some(ParameterValue::Float(v)) => Ok(*v),
            Some(ParameterValue::Int(v)) => Ok(*v as f64),
            other => anyhow::bail!("expected a number for {param}, got {other:?}"),
        }
    }
}

impl Learner for ToyLearner {
    type Model = String;

    fn learn(
        &mut self,
        config: &Configuration,
        num_epochs: &[ParameterValue],
        _seed: u64,
    ) -> anyhow::Result<Vec<Checkpoint<String>>> {
        let lr = Self::numeric(config, "lr")?;
        let hidden = Self::numeric(config, "hidden")?;
        let activation_bonus = match config.get("activation") {
            Some(ParameterValue::Text(a)) if a == "tanh" => 0.03,
            _ => 0.0,
        };

        let lr_penalty = (lr.log10() - 0.003_f64.log10()).powi(2) * 0.05;
        let hidden_penalty = (hidden.log2() - 7.0).powi(2) * 0.02;

        num_epochs
            .iter()
            .map(|epoch| {
                let epochs = match epoch {
                    ParameterValue::Int(e) => *e as f64,
                    other => anyhow::bail!("unexpected checkpoint {other}"),
                };
                let accuracy =
                    (0.9 - lr_penalty - hidden_penalty + activation_bonus - 0.2 / epochs).max(0.0);
                Ok(Checkpoint {
                    epoch: epoch.clone(),
                    model: format!("toy-model {config} @ {epoch}"),
                    val_loss: 1.0 - accuracy,
                    val_accuracy: accuracy,
                })
            })
            .collect()
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let full_range = FullRange::from_json_str(
        r#"{
            "lr": [0.00001, 0.0001, 0.001, 0.003, 0.01, 0.1, 1.0],
            "hidden": [16, 32, 64, 128, 256, 512],
            "activation": {"unordered": ["relu", "tanh"]},
            "num_epochs": [1, 5, 10]
        }"#,
    )?;
    let config = SearchConfig::new("toy").with_seed(7).with_attempts_per_param(3);

    let mut search = SubrangeSearch::new(config, full_range)?;
    let outcome = search.run(&mut ToyLearner)?;

    println!("{}", serde_json::to_string_pretty(&outcome.status)?);
    match outcome.into_best_pair() {
        Some((model, config)) => println!("best: {config} -> {model}"),
        None => println!("no configuration beat accuracy 0.0"),
    }
    Ok(())
}
