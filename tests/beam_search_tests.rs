use candle_core::{DType, Device, Tensor};
use seq2seq_eval::data::Batch;
use seq2seq_eval::models::{BeamSearchModel, GenerateOptions, Seq2SeqLm, Seq2SeqModel};

const PAD: u32 = 0;
const START: u32 = 1;
const EOS: u32 = 2;
const A: u32 = 3;
const B: u32 = 4;
const PAREN: u32 = 5;
const VOCAB: usize = 6;
const TINY: f32 = 1e-6;

/// Next-token distribution depends only on the previous token; each sums to ~1.
struct ToyLm {
    device: Device,
}

impl ToyLm {
    fn next_probs(prev: u32) -> [f32; VOCAB] {
        let mut p = [TINY; VOCAB];
        match prev {
            START => {
                p[A as usize] = 0.6;
                p[B as usize] = 0.4;
            }
            A => {
                p[A as usize] = 0.33;
                p[B as usize] = 0.33;
                p[EOS as usize] = 0.34;
            }
            PAREN => {
                p[A as usize] = 0.7;
                p[EOS as usize] = 0.2;
                p[B as usize] = 0.1;
            }
            _ => {
                p[EOS as usize] = 0.9;
                p[A as usize] = 0.1;
            }
        }
        p
    }
}

impl Seq2SeqLm for ToyLm {
    fn encode(&self, input_ids: &Tensor, _attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        input_ids.to_dtype(DType::F32)?.unsqueeze(2)
    }

    fn decode(
        &self,
        decoder_input_ids: &Tensor,
        _encoder_states: &Tensor,
        _attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let rows = decoder_input_ids.to_vec2::<u32>()?;
        let (batch, len) = (rows.len(), rows.first().map_or(0, Vec::len));
        let logits: Vec<f32> = rows
            .iter()
            .flat_map(|row| row.iter().flat_map(|&t| Self::next_probs(t).map(f32::ln)))
            .collect();
        Tensor::from_vec(logits, (batch, len, VOCAB), &self.device)
    }

    fn eos_token_id(&self) -> u32 {
        EOS
    }

    fn pad_token_id(&self) -> u32 {
        PAD
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

fn model() -> BeamSearchModel<ToyLm> {
    BeamSearchModel::new(ToyLm { device: Device::Cpu }, START)
}

fn generate(options: GenerateOptions) -> anyhow::Result<Vec<u32>> {
    let input = Tensor::new(&[[7u32, 8]], &Device::Cpu)?;
    let mask = Tensor::new(&[[1u32, 1]], &Device::Cpu)?;
    let mut out = model().generate(&input, &mask, &options)?;
    Ok(out.remove(0))
}

#[test]
fn wider_beam_finds_better_sequence() -> anyhow::Result<()> {
    let options = GenerateOptions::new(START).max_length(6);
    assert_eq!(generate(options.clone().num_beams(2))?, vec![START, B, EOS]);
    assert_eq!(generate(options.num_beams(1))?, vec![START, A, EOS]);
    Ok(())
}

#[test]
fn forced_bos_is_first_generated_token() -> anyhow::Result<()> {
    let out = generate(
        GenerateOptions::new(START)
            .num_beams(2)
            .max_length(6)
            .forced_bos_token_id(PAREN),
    )?;
    assert_eq!(&out[..2], &[START, PAREN]);
    assert_eq!(out.last(), Some(&EOS));
    Ok(())
}

#[test]
fn bad_words_are_never_generated() -> anyhow::Result<()> {
    let out = generate(
        GenerateOptions::new(START)
            .num_beams(2)
            .max_length(6)
            .bad_words_ids(vec![vec![B]]),
    )?;
    assert_eq!(out, vec![START, A, EOS]);
    Ok(())
}

#[test]
fn max_length_forces_eos() -> anyhow::Result<()> {
    // with EOS suppressed until the limit, only the limit can end the sequence
    let out = generate(
        GenerateOptions::new(START)
            .num_beams(1)
            .max_length(4)
            .bad_words_ids(vec![vec![EOS]]),
    )?;
    assert_eq!(out.len(), 4);
    assert_eq!(out.last(), Some(&EOS));
    Ok(())
}

#[test]
fn one_sequence_per_input_row() -> anyhow::Result<()> {
    let input = Tensor::new(&[[7u32, 8], [9, 0]], &Device::Cpu)?;
    let mask = Tensor::new(&[[1u32, 1], [1, 0]], &Device::Cpu)?;
    let options = GenerateOptions::new(START).num_beams(2).max_length(6);
    let out = model().generate(&input, &mask, &options)?;
    assert_eq!(out, vec![vec![START, B, EOS], vec![START, B, EOS]]);
    Ok(())
}

#[test]
fn loss_ignores_padding() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let padded = Batch::from_rows(&[vec![7, 8], vec![9]], &[vec![A, EOS], vec![A]], PAD, &device)?;
    let single = Batch::from_rows(&[vec![7, 8]], &[vec![A, EOS]], PAD, &device)?;

    let model = model();
    // -(ln 0.6 + ln 0.34) / 2
    let expected = -(0.6f32.ln() + 0.34f32.ln()) / 2.0;
    assert!((model.loss(&single)? - expected).abs() < 1e-3);

    // the padded row adds one real position (A after start) and one ignored one
    let expected_padded = -(0.6f32.ln() * 2.0 + 0.34f32.ln()) / 3.0;
    assert!((model.loss(&padded)? - expected_padded).abs() < 1e-3);
    Ok(())
}
