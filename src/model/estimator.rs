//! Estimators that turn an encoded feature row into class probabilities.

use serde::Deserialize;

/// Final stage of a tabular pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticRegression),
    Forest(RandomForest),
}

impl Estimator {
    pub fn classes(&self) -> &[i64] {
        match self {
            Estimator::Logistic(m) => &m.classes,
            Estimator::Forest(m) => &m.classes,
        }
    }

    /// Check internal consistency against the encoded row width.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.classes().len() < 2 {
            return Err("estimator needs at least two classes".to_string());
        }
        match self {
            Estimator::Logistic(m) => m.validate(n_features),
            Estimator::Forest(m) => m.validate(n_features),
        }
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, String> {
        match self {
            Estimator::Logistic(m) => Ok(m.predict_proba(row)),
            Estimator::Forest(m) => m.predict_proba(row),
        }
    }
}

/// Linear model; one coefficient row for binary problems, one per class
/// (softmax) otherwise.
#[derive(Clone, Debug, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let rows = if self.classes.len() == 2 { 1 } else { self.classes.len() };
        if self.coef.len() != rows || self.intercept.len() != rows {
            return Err(format!(
                "logistic model for {} classes needs {rows} coefficient rows and intercepts, got {} and {}",
                self.classes.len(),
                self.coef.len(),
                self.intercept.len()
            ));
        }
        if let Some(bad) = self.coef.iter().find(|row| row.len() != n_features) {
            return Err(format!(
                "coefficient row has {} weights for {n_features} encoded features",
                bad.len()
            ));
        }
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        if self.classes.len() == 2 {
            let p1 = sigmoid(logits[0]);
            return vec![1.0 - p1, p1];
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }
}

/// Averaged ensemble of axis-aligned decision trees.
#[derive(Clone, Debug, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features, self.classes.len())
                .map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, String> {
        let mut total = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_value(row)?;
            let weight: f64 = leaf.iter().sum();
            for (acc, v) in total.iter_mut().zip(leaf) {
                if weight > 0.0 {
                    *acc += v / weight;
                }
            }
        }
        let n = self.trees.len() as f64;
        Ok(total.into_iter().map(|p| p / n).collect())
    }
}

/// Tree stored as parallel node arrays. A node is a leaf when both children
/// are `-1`; otherwise rows with `x[feature] <= threshold` go left.
#[derive(Clone, Debug, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("empty tree".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err("node arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                if self.value[node].len() != n_classes {
                    return Err(format!(
                        "leaf {node} has {} class weights for {n_classes} classes",
                        self.value[node].len()
                    ));
                }
                continue;
            }
            let in_range = |child: i64| child > node as i64 && (child as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("node {node} has invalid children ({left}, {right})"));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
        }
        Ok(())
    }

    fn leaf_value(&self, row: &[f64]) -> Result<&[f64], String> {
        let mut node = 0usize;
        // Children always point forward (checked at load), so the walk ends.
        for _ in 0..self.node_count() {
            let left = self.children_left[node];
            if left == LEAF {
                return Ok(&self.value[node]);
            }
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
        Err("tree walk did not reach a leaf".to_string())
    }
}

/// Platt scaling applied to the positive-class probability of a binary model.
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct SigmoidCalibration {
    pub a: f64,
    pub b: f64,
}

impl SigmoidCalibration {
    pub fn apply(&self, p: f64) -> f64 {
        1.0 / (1.0 + (self.a * p + self.b).exp())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
