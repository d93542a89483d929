use std::fmt::Write as _;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

const NDIM: usize = 3;
const BOX_SIZE: f64 = 100.0;

/// A chain of maxima (type 3) and saddles (type 2) joined by noisy filaments.
fn generate(n_points: usize, samples_per_filament: usize, rng: &mut SimpleRng) -> String {
    let positions: Vec<[f64; NDIM]> = (0..n_points)
        .map(|_| std::array::from_fn(|_| rng.uniform(0.0, BOX_SIZE)))
        .collect();
    let values: Vec<f64> = (0..n_points).map(|_| rng.uniform(1.0, 10.0)).collect();

    // filament k joins point k and point k + 1
    let n_filaments = n_points.saturating_sub(1);
    let mut connections: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n_points];
    for k in 0..n_filaments {
        connections[k].push((k + 1, k));
        connections[k + 1].push((k, k));
    }

    let mut out = String::new();
    out.push_str("ANDSKEL\n");
    let _ = writeln!(out, "{NDIM}");
    out.push_str("#synthetic skeleton written by generate_sample\n");
    let _ = writeln!(out, "BBOX [0,0,0] [{BOX_SIZE},{BOX_SIZE},{BOX_SIZE}]");

    out.push_str("[CRITICAL POINTS]\n");
    let _ = writeln!(out, "{n_points}");
    for (i, pos) in positions.iter().enumerate() {
        let point_type = if i % 2 == 0 { 3 } else { 2 };
        // pair even points with the following odd one
        let pair = if i % 2 == 0 && i + 1 < n_points {
            i + 1
        } else if i % 2 == 1 {
            i - 1
        } else {
            i
        };
        let _ = writeln!(
            out,
            "{point_type} {} {} {} {} {pair} 0",
            pos[0], pos[1], pos[2], values[i]
        );
        let _ = writeln!(out, " {}", connections[i].len());
        for (dest, fil) in &connections[i] {
            let _ = writeln!(out, " {dest} {fil}");
        }
    }

    out.push_str("[FILAMENTS]\n");
    let _ = writeln!(out, "{n_filaments}");
    for k in 0..n_filaments {
        let (a, b) = (positions[k], positions[k + 1]);
        let _ = writeln!(out, "{k} {} {samples_per_filament}", k + 1);
        for s in 0..samples_per_filament {
            let t = s as f64 / (samples_per_filament.max(2) - 1) as f64;
            let coords: Vec<String> = (0..NDIM)
                .map(|d| {
                    let jitter = if s == 0 || s + 1 == samples_per_filament {
                        0.0
                    } else {
                        rng.uniform(-0.5, 0.5)
                    };
                    format!("{}", a[d] + t * (b[d] - a[d]) + jitter)
                })
                .collect();
            let _ = writeln!(out, " {}", coords.join(" "));
        }
    }

    out.push_str("[CRITICAL POINTS DATA]\n2\npersistence\nfield_value\n");
    for (i, v) in values.iter().enumerate() {
        let persistence = if i % 2 == 0 { rng.uniform(0.0, 5.0) } else { 0.0 };
        let _ = writeln!(out, "{persistence} {v}");
    }

    out.push_str("[FILAMENTS DATA]\n1\nlength\n");
    for k in 0..n_filaments {
        let (a, b) = (positions[k], positions[k + 1]);
        let length = (0..NDIM).map(|d| (b[d] - a[d]).powi(2)).sum::<f64>().sqrt();
        let _ = writeln!(out, "{length}");
    }

    out
}

fn main() {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample.NDskl".to_string());

    let mut rng = SimpleRng::new(42);
    let n_points = 12;
    let text = generate(n_points, 8, &mut rng);

    std::fs::write(&output_path, text).expect("Failed to write output file");

    println!(
        "Wrote {n_points} critical points and {} filaments to {output_path}",
        n_points - 1
    );
}
