use crate::batch;
use crate::kdtree::KdTree;
use crate::search::Neighbor;
use js_sys::Array;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

fn flatten(found: &[Neighbor]) -> Vec<f64> {
    let mut out = Vec::with_capacity(found.len() * 2);
    for n in found {
        out.push(n.index as f64);
        out.push(n.distance());
    }
    out
}

fn flatten_pairs(found: Vec<Option<Neighbor>>) -> Vec<f64> {
    found
        .into_iter()
        .flat_map(|n| match n {
            Some(n) => [n.index as f64, n.distance()],
            None => [-1.0, f64::NAN],
        })
        .collect()
}

/// WASM wrapper around a k-d tree over a flat `[x0, y0, z0, x1, y1, z1, ...]` position buffer.
///
/// Query results use the same flat style: `[index0, distance0, index1, distance1, ...]`,
/// with true (not squared) distances. An empty buffer yields a tree that finds nothing.
#[wasm_bindgen(js_name = KdTree)]
pub struct KdTree3D {
    inner: Option<KdTree>,
}

#[wasm_bindgen(js_class = KdTree)]
impl KdTree3D {
    #[wasm_bindgen(constructor)]
    pub fn new(positions: &[f64]) -> KdTree3D {
        KdTree3D { inner: KdTree::from_flat(positions) }
    }

    /// Replaces the tree with one built from new positions.
    pub fn rebuild(&mut self, positions: &[f64]) {
        self.inner = KdTree::from_flat(positions);
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.inner.as_ref().map_or(0, |t| t.len())
    }

    #[wasm_bindgen(getter)]
    pub fn depth(&self) -> usize {
        self.inner.as_ref().map_or(0, |t| t.depth())
    }

    /// Returns `[index, distance]` of the closest point, or `undefined` for an empty tree.
    pub fn nearest(&self, x: f64, y: f64, z: f64) -> JsValue {
        match self.inner.as_ref().and_then(|t| t.nearest([x, y, z])) {
            Some(n) => {
                let pair = Array::new();
                pair.push(&JsValue::from_f64(n.index as f64));
                pair.push(&JsValue::from_f64(n.distance()));
                pair.into()
            }
            None => JsValue::UNDEFINED,
        }
    }

    pub fn k_nearest(&self, x: f64, y: f64, z: f64, k: usize) -> Vec<f64> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |t| flatten(&t.k_nearest([x, y, z], k)))
    }

    pub fn within_radius(&self, x: f64, y: f64, z: f64, radius: f64) -> Vec<f64> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |t| flatten(&t.within_radius([x, y, z], radius)))
    }

    /// Nearest point for every query in a flat `[x, y, z, ...]` buffer, computed in parallel.
    ///
    /// Returns one `[index, distance]` pair per query; `[-1, NaN]` where nothing was found.
    pub fn nearest_batch(&self, queries: &[f64]) -> Vec<f64> {
        flatten_pairs(batch::nearest_batch_flat(&self.inner, queries))
    }

    /// Like `nearest_batch`, but skips points within `epsilon` of each query, so passing the
    /// indexed positions back in yields each point's closest other point.
    pub fn nearest_other_batch(&self, queries: &[f64], epsilon: f64) -> Vec<f64> {
        let queries: Vec<[f64; 3]> = queries.chunks_exact(3).map(|q| [q[0], q[1], q[2]]).collect();
        flatten_pairs(batch::nearest_other_batch(&self.inner, &queries, epsilon))
    }

    pub fn dump(&self) -> String {
        self.inner.as_ref().map_or_else(String::new, |t| t.dump())
    }
}
