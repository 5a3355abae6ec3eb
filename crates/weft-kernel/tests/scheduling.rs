//! Draw distribution and reproducibility of the stream

use weft_kernel::Stream;
use weft_test_utils::bare_codelet;

#[test]
fn draws_follow_urgency_ratio() {
    const DRAWS: usize = 100_000;
    let mut stream = Stream::new(2024);
    stream.insert(bare_codelet("low", 1.0));
    stream.insert(bare_codelet("high", 3.0));

    let mut high = 0usize;
    for _ in 0..DRAWS {
        let codelet = stream.draw().unwrap().expect("stream never empties");
        if codelet.family().as_str() == "high" {
            high += 1;
        }
        stream.insert(codelet);
    }

    #[allow(clippy::cast_precision_loss)]
    let share = high as f64 / DRAWS as f64;
    assert!((share - 0.75).abs() < 0.02, "high share {share}");
}

#[test]
fn equal_urgencies_replay_with_same_seed() {
    let replay = |seed: u64| {
        let mut stream = Stream::new(seed);
        for name in ["a", "b", "c", "d", "e", "f"] {
            stream.insert(bare_codelet(name, 1.0));
        }
        std::iter::from_fn(|| stream.draw().unwrap())
            .map(|c| c.family().to_string())
            .collect::<Vec<_>>()
    };

    assert_eq!(replay(5), replay(5));
    assert_eq!(replay(5).len(), 6);
}
