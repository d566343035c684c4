//! Local Maxima Detection

/// Indices of local maxima with `signal[i] >= height`, thinned so that no two
/// accepted peaks are closer than `distance` samples.
///
/// A sample is a local maximum when it rises above its left neighbour and the
/// signal then falls on the right; a flat top is reported at its middle sample
/// (rounded down). The first and last samples are never peaks. Thinning keeps
/// the tallest candidates first, breaking ties from left to right.
pub fn find_peaks(signal: &[f64], height: f64, distance: usize) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(signal)
        .into_iter()
        .filter(|&i| signal[i] >= height)
        .collect();

    if distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        signal[candidates[b]]
            .total_cmp(&signal[candidates[a]])
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; candidates.len()];
    for &idx in &order {
        if !keep[idx] {
            continue;
        }
        let pos = candidates[idx];

        let mut j = idx;
        while j > 0 && pos - candidates[j - 1] < distance {
            keep[j - 1] = false;
            j -= 1;
        }
        let mut j = idx + 1;
        while j < candidates.len() && candidates[j] - pos < distance {
            keep[j] = false;
            j += 1;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(pos, kept)| kept.then_some(pos))
        .collect()
}

fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
