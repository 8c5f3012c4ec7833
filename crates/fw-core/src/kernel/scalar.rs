use crate::semiring::Semiring;
use crate::view::{Layout, TileView};

pub fn update_aliased<S, L>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    for k in 0..b.rows {
        for i in 0..c.rows {
            let via = L::via(buf, a, i, k);
            for j in 0..c.cols {
                let idx = c.at(i, j);
                buf[idx] = S::update(buf[idx], via, buf[b.at(k, j)]);
            }
        }
    }
}

pub fn update_disjoint<S, L>(buf: &mut [S::Elem], a: TileView, b: TileView, c: TileView)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    for i in 0..c.rows {
        for j in 0..c.cols {
            let idx = c.at(i, j);
            let mut acc = buf[idx];
            for k in 0..b.rows {
                acc = S::update(acc, L::via(buf, a, i, k), buf[b.at(k, j)]);
            }
            buf[idx] = acc;
        }
    }
}
