mod common;

use common::{loader, write_lines, EchoModel, FixedScorer, WordTokenizer};
use seq2seq_eval::data::ParallelTextLoader;
use seq2seq_eval::pipelines::{Evaluator, UccaEvaluator, UccaEvaluatorBuilder};
use seq2seq_eval::ucca::{MrpGraph, TOY_SENT};
use seq2seq_eval::EvalError;
use std::path::Path;

const GOLD: [&str; 2] = [
    "[ <root_0> H [ <H_0> A [ cats ] P [ sleep ] ] ]",
    "[ <root_0> H [ <H_0> P [ rains ] ] ]",
];
const SENTS: [&str; 2] = ["cats sleep", "rains"];

fn evaluator(
    dir: &Path,
    generated: &[&str],
    gold: &[&str],
    scorer: FixedScorer,
) -> anyhow::Result<UccaEvaluator<EchoModel, WordTokenizer, ParallelTextLoader>> {
    let gold_file = dir.join("dev.graph");
    let sent_file = dir.join("dev.sent");
    write_lines(&gold_file, gold);
    write_lines(&sent_file, &SENTS);

    let tokenizer = WordTokenizer::new();
    let dataloader = loader(&tokenizer, generated, generated, 2);
    UccaEvaluatorBuilder::new(EchoModel::new(0.25), tokenizer, dataloader)
        .gold_file(gold_file)
        .sent_path(sent_file)
        .pred_save_dir(dir)
        .split("dev")
        .scorer(scorer)
        .build()
}

fn read_mrp(path: &Path) -> anyhow::Result<Vec<MrpGraph>> {
    std::fs::read_to_string(path)?
        .lines()
        .map(|line| serde_json::from_str::<MrpGraph>(line).map_err(anyhow::Error::from))
        .collect()
}

#[test]
fn perfect_predictions_write_aligned_mrp_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let scorer = FixedScorer::new(1.0);
    let mut evaluator = evaluator(dir.path(), &GOLD, &GOLD, scorer.clone())?;

    let report = evaluator.run_eval(Some(2))?;
    assert_eq!(report.score, 1.0);
    assert_eq!(report.loss, Some(0.25));

    let gold_mrp = read_mrp(&dir.path().join("dev.gold.mrp"))?;
    let pred_mrp = read_mrp(&dir.path().join("dev.pred.mrp"))?;
    assert_eq!(gold_mrp.len(), 2);
    assert_eq!(pred_mrp, gold_mrp);
    assert_eq!(gold_mrp[0].input, "cats sleep");
    assert_eq!(gold_mrp[1].input, "rains");
    assert!(gold_mrp.iter().all(|g| g.framework == "ucca"));

    let (scored_gold, scored_pred) = scorer.last.lock().unwrap().clone().unwrap();
    assert_eq!(scored_gold, dir.path().join("dev.gold.mrp"));
    assert_eq!(scored_pred, dir.path().join("dev.pred.mrp"));

    let raw = std::fs::read_to_string(dir.path().join("step_2/ucca.pred.tf"))?;
    assert_eq!(raw.lines().count(), 2);
    Ok(())
}

#[test]
fn malformed_prediction_falls_back_at_its_own_index() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let generated = [GOLD[0], "[ H [ <H_0> P ["];
    let mut evaluator = evaluator(dir.path(), &generated, &GOLD, FixedScorer::new(0.5))?;

    evaluator.run_eval(None)?;

    let pred_mrp = read_mrp(&dir.path().join("dev.pred.mrp"))?;
    assert_eq!(pred_mrp.len(), 2);
    assert_eq!(pred_mrp[0].input, "cats sleep");
    assert_eq!(pred_mrp[1].input, TOY_SENT);

    let gold_mrp = read_mrp(&dir.path().join("dev.gold.mrp"))?;
    assert_eq!(gold_mrp[1].input, "rains");
    Ok(())
}

#[test]
fn delinearization_reports_each_fallback() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let evaluator = evaluator(dir.path(), &GOLD, &GOLD, FixedScorer::new(0.0))?;

    let restored = evaluator.delinearize_to_tree(&[GOLD[0], "not a graph", GOLD[1]]);
    let fallbacks: Vec<bool> = restored.iter().map(|r| r.is_fallback()).collect();
    assert_eq!(fallbacks, vec![false, true, false]);
    assert_eq!(restored[0].tree().words(), vec!["cats", "sleep"]);
    Ok(())
}

#[test]
fn misaligned_inputs_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let scorer = FixedScorer::new(1.0);
    let gold = [GOLD[0], GOLD[1], GOLD[1]];
    let mut evaluator = evaluator(dir.path(), &GOLD, &gold, scorer.clone())?;

    let err = evaluator.run_eval(Some(1)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::Misaligned {
            predictions: 2,
            graphs: 3,
            sentences: 2
        })
    ));
    assert_eq!(scorer.calls(), 0);
    Ok(())
}

#[test]
fn missing_gold_file_fails_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = WordTokenizer::new();
    let dataloader = loader(&tokenizer, &GOLD, &GOLD, 1);
    let built = UccaEvaluatorBuilder::new(EchoModel::new(0.0), tokenizer, dataloader)
        .gold_file(dir.path().join("absent.graph"))
        .sent_path(dir.path().join("absent.sent"))
        .build();
    assert!(built.is_err());
}
