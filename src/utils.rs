use indicatif::{ProgressState, ProgressStyle};

pub fn get_tqdm_style() -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::with_template(
        "{percent:>3}% |{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {custom_per_sec}] {msg}",
    )?
    .with_key(
        "custom_per_sec",
        |s: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.2} it/s", s.per_sec());
        },
    )
    .progress_chars("██ "))
}
