use crate::clauses::ClauseSink;

/// Sequential-counter encoding of "exactly `k` of `lits` are true", linear in
/// the number of literals. Register `s[i][j]` (0-based) holds iff at least
/// `j + 1` of the first `i + 1` literals are true; both implication
/// directions are emitted so the final register can assert the lower bound.
/// Returns the next free variable after the gadget's auxiliaries.
pub(crate) fn exactly_k(
    lits: &[i32],
    k: u32,
    next_var: i32,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<i32> {
    let m = lits.len();
    let k = k as usize;
    debug_assert!(k <= m, "callers must skip over-demanded literal sets");

    if k == 0 {
        for &x in lits {
            sink.add(&[-x])?;
        }
        return Ok(next_var);
    }
    if k >= m {
        for &x in lits {
            sink.add(&[x])?;
        }
        return Ok(next_var);
    }

    let reg = |i: usize, j: usize| next_var + (i * k + j) as i32;

    for (i, &x) in lits.iter().enumerate() {
        sink.add(&[-x, reg(i, 0)])?;
        if i == 0 {
            sink.add(&[-reg(0, 0), x])?;
            for j in 1..k {
                sink.add(&[-reg(0, j)])?;
            }
            continue;
        }
        sink.add(&[-reg(i - 1, 0), reg(i, 0)])?;
        sink.add(&[-reg(i, 0), reg(i - 1, 0), x])?;
        for j in 1..k {
            sink.add(&[-x, -reg(i - 1, j - 1), reg(i, j)])?;
            sink.add(&[-reg(i - 1, j), reg(i, j)])?;
            sink.add(&[-reg(i, j), reg(i - 1, j), x])?;
            sink.add(&[-reg(i, j), reg(i - 1, j), reg(i - 1, j - 1)])?;
        }
        // a (k+1)-th true literal would overflow the counter
        sink.add(&[-x, -reg(i - 1, k - 1)])?;
    }
    sink.add(&[reg(m - 1, k - 1)])?;

    Ok(next_var + (m * k) as i32)
}
