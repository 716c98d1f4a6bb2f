// Quick release mode performance check
//
// Run with: cargo test --release -p shrike-core scan_perf -- --ignored

#[cfg(test)]
mod perf_tests {
    use crate::Detector;
    use std::time::Instant;

    #[test]
    #[ignore] // Run with: cargo test --release scan_perf -- --ignored
    fn scan_perf() {
        let words: Vec<String> = (0..5_000).map(|i| format!("word{i:05}")).collect();
        let detector = Detector::new();
        detector.build(&words).unwrap();

        let text = "filler text around word02500 and word00042 plus noise w.o.r.d".repeat(16);

        // Warmup
        for _ in 0..1_000 {
            let _ = detector.process(&text);
        }

        // Benchmark
        let iterations = 10_000u32;
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = detector.process(&text);
        }
        let duration = start.elapsed();
        let us_per_scan = duration.as_micros() / iterations as u128;

        println!("\n=== Release Mode Scan Performance ===");
        println!("Text length: {} chars", text.chars().count());
        println!("Iterations: {}", iterations);
        println!("Total time: {:?}", duration);
        println!("Per scan: {} us", us_per_scan);

        // A ~1000-char scan over 5k patterns should stay comfortably
        // under a millisecond in release mode.
        assert!(us_per_scan < 1_000, "scan too slow: {} us", us_per_scan);
    }
}
