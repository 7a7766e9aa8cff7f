use rand::Rng;

use newsroom_common::WeightTable;

/// Draw one label with probability proportional to its weight.
///
/// Linear scan in table order. Returns `None` only for an empty table. When
/// every weight is zero the draw is always `0` and the first label wins.
pub fn pick<'a, R: Rng + ?Sized>(weights: &'a WeightTable, rng: &mut R) -> Option<&'a str> {
    let first = weights.first_label()?;
    let mut r = rng.random::<f64>() * weights.total();

    for (label, weight) in weights.iter() {
        if r < weight {
            return Some(label);
        }
        r -= weight;
    }

    Some(first)
}
