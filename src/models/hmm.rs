//! Gaussian Hidden Markov Model with diagonal covariances

use super::algorithms::{backward, forward, log_emissions, posteriors, viterbi};
use super::error::{check_lengths, FitError, FitResult, ScoreError, ScoreResult};
use super::gaussian::DiagonalGaussian;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Posterior mass below which a state is treated as unused in the M-step
const MIN_POSTERIOR: f64 = 1e-10;

/// Training settings for Baum-Welch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmmConfig {
    /// Maximum number of EM iterations
    pub n_iter: usize,
    /// Convergence threshold on the log-likelihood gain
    pub tol: f64,
    /// Floor added to every variance
    pub min_covar: f64,
    /// K-means iterations used to initialize the emission means
    pub kmeans_iter: usize,
}

impl Default for HmmConfig {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            tol: 1e-2,
            min_covar: 1e-3,
            kmeans_iter: 10,
        }
    }
}

impl HmmConfig {
    /// Set maximum number of EM iterations
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

/// Expected counts gathered in one E-step over all sequences
struct SufficientStats {
    start: Array1<f64>,
    trans: Array2<f64>,
    post: Array1<f64>,
    obs: Array2<f64>,
    obs_sq: Array2<f64>,
    log_likelihood: f64,
}

impl SufficientStats {
    fn zeros(n_states: usize, n_features: usize) -> Self {
        Self {
            start: Array1::zeros(n_states),
            trans: Array2::zeros((n_states, n_states)),
            post: Array1::zeros(n_states),
            obs: Array2::zeros((n_states, n_features)),
            obs_sq: Array2::zeros((n_states, n_features)),
            log_likelihood: 0.0,
        }
    }
}

/// Gaussian Hidden Markov Model
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianHmm {
    n_states: usize,
    n_features: usize,
    start_prob: Array1<f64>,
    transmat: Array2<f64>,
    emissions: Vec<DiagonalGaussian>,
    log_likelihood_history: Vec<f64>,
    converged: bool,
}

impl GaussianHmm {
    /// Build a model from explicit parameters
    ///
    /// # Arguments
    /// * `start_prob` - Initial state probabilities (N)
    /// * `transmat` - Row-stochastic transition matrix (N x N)
    /// * `means` - Emission means (N x D)
    /// * `variances` - Emission variances (N x D)
    pub fn from_params(
        start_prob: Array1<f64>,
        transmat: Array2<f64>,
        means: Array2<f64>,
        variances: Array2<f64>,
    ) -> FitResult<Self> {
        let n_states = start_prob.len();
        if n_states == 0 {
            return Err(FitError::InvalidParameters("model needs at least one state".into()));
        }
        if transmat.dim() != (n_states, n_states) {
            return Err(FitError::InvalidParameters(format!(
                "transition matrix is {:?}, expected ({n_states}, {n_states})",
                transmat.dim()
            )));
        }
        if means.nrows() != n_states || variances.dim() != means.dim() {
            return Err(FitError::InvalidParameters(format!(
                "means {:?} and variances {:?} must both be ({n_states}, d)",
                means.dim(),
                variances.dim()
            )));
        }
        if (start_prob.sum() - 1.0).abs() > 1e-6 {
            return Err(FitError::InvalidParameters("start probabilities must sum to 1".into()));
        }
        for (i, row) in transmat.rows().into_iter().enumerate() {
            if (row.sum() - 1.0).abs() > 1e-6 {
                return Err(FitError::InvalidParameters(format!(
                    "transition row {i} does not sum to 1"
                )));
            }
        }

        let emissions: Vec<DiagonalGaussian> = means
            .rows()
            .into_iter()
            .zip(variances.rows())
            .map(|(m, v)| DiagonalGaussian::new(m.to_owned(), v.to_owned()))
            .collect();
        if emissions.iter().any(|e| !e.is_valid()) {
            return Err(FitError::InvalidParameters(
                "emission parameters must be finite with positive variances".into(),
            ));
        }

        Ok(Self {
            n_states,
            n_features: means.ncols(),
            start_prob,
            transmat,
            emissions,
            log_likelihood_history: vec![],
            converged: false,
        })
    }

    /// Fit a model to concatenated sequences using Baum-Welch (EM)
    ///
    /// # Arguments
    /// * `n_states` - Number of hidden states
    /// * `x` - Concatenated observations (frames x features)
    /// * `lengths` - Frame count of each sequence in `x`
    /// * `seed` - Seed for the k-means initialization
    /// * `config` - Iteration cap, tolerance and variance floor
    pub fn fit(
        n_states: usize,
        x: &Array2<f64>,
        lengths: &[usize],
        seed: u64,
        config: &HmmConfig,
    ) -> FitResult<Self> {
        if n_states == 0 {
            return Err(FitError::InvalidParameters("model needs at least one state".into()));
        }
        check_lengths(x.nrows(), lengths).map_err(FitError::InvalidLengths)?;
        if x.ncols() == 0 {
            return Err(FitError::InvalidParameters("observations have no features".into()));
        }
        if x.nrows() < n_states {
            return Err(FitError::InsufficientData {
                n_states,
                n_frames: x.nrows(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut model = Self::initialize(n_states, x, config, &mut rng);

        let mut prev_ll = f64::NEG_INFINITY;
        for iter in 0..config.n_iter {
            let stats = model.expectation(x, lengths);
            let log_ll = stats.log_likelihood;
            if !log_ll.is_finite() {
                return Err(FitError::NumericalFailure {
                    iteration: iter,
                    message: "log-likelihood is not finite".into(),
                });
            }

            model.maximization(&stats, config.min_covar);
            model.log_likelihood_history.push(log_ll);

            if !model.is_valid() {
                return Err(FitError::NumericalFailure {
                    iteration: iter,
                    message: "parameters became degenerate".into(),
                });
            }

            if (log_ll - prev_ll).abs() < config.tol {
                model.converged = true;
                tracing::trace!("Converged after {} iterations", iter + 1);
                break;
            }
            prev_ll = log_ll;
        }

        Ok(model)
    }

    /// Uniform start/transition probabilities, k-means means, global variance
    fn initialize(n_states: usize, x: &Array2<f64>, config: &HmmConfig, rng: &mut StdRng) -> Self {
        let n_features = x.ncols();
        let centers = kmeans_centers(x, n_states, config.kmeans_iter, rng);

        let n = x.nrows() as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let mut variance = Array1::zeros(n_features);
        for row in x.rows() {
            let diff = &row - &mean;
            variance += &(&diff * &diff);
        }
        variance /= n;
        variance.mapv_inplace(|v: f64| v + config.min_covar);

        let emissions = centers
            .into_iter()
            .map(|c| DiagonalGaussian::new(c, variance.clone()))
            .collect();

        Self {
            n_states,
            n_features,
            start_prob: Array1::from_elem(n_states, 1.0 / n_states as f64),
            transmat: Array2::from_elem((n_states, n_states), 1.0 / n_states as f64),
            emissions,
            log_likelihood_history: vec![],
            converged: false,
        }
    }

    /// E-step: accumulate expected counts over every sequence
    fn expectation(&self, x: &Array2<f64>, lengths: &[usize]) -> SufficientStats {
        let n = self.n_states;
        let log_start = self.start_prob.mapv(f64::ln);
        let log_trans = self.transmat.mapv(f64::ln);
        let mut stats = SufficientStats::zeros(n, self.n_features);

        for seq in split_sequences(x, lengths) {
            let log_b = log_emissions(seq, &self.emissions);
            let (alpha, log_ll) = forward(&log_start, &log_trans, &log_b);
            stats.log_likelihood += log_ll;
            if !log_ll.is_finite() {
                return stats;
            }

            let beta = backward(&log_trans, &log_b);
            let gamma = posteriors(&alpha, &beta, log_ll);

            stats.start += &gamma.row(0);
            for t in 0..seq.nrows().saturating_sub(1) {
                for i in 0..n {
                    for j in 0..n {
                        let log_xi = alpha[[t, i]] + log_trans[[i, j]] + log_b[[t + 1, j]]
                            + beta[[t + 1, j]]
                            - log_ll;
                        stats.trans[[i, j]] += log_xi.exp();
                    }
                }
            }
            stats.post += &gamma.sum_axis(Axis(0));
            stats.obs += &gamma.t().dot(&seq);
            stats.obs_sq += &gamma.t().dot(&seq.mapv(|v| v * v));
        }

        stats
    }

    /// M-step: re-estimate parameters from expected counts
    fn maximization(&mut self, stats: &SufficientStats, min_covar: f64) {
        let start_sum = stats.start.sum();
        if start_sum > 0.0 {
            self.start_prob = &stats.start / start_sum;
        }

        for i in 0..self.n_states {
            let row_sum: f64 = stats.trans.row(i).sum();
            if row_sum > 0.0 {
                let row = &stats.trans.row(i) / row_sum;
                self.transmat.row_mut(i).assign(&row);
            }
        }

        for j in 0..self.n_states {
            let weight = stats.post[j];
            if weight < MIN_POSTERIOR {
                // Unused state keeps its previous emission
                continue;
            }
            let mean = &stats.obs.row(j) / weight;
            let second = &stats.obs_sq.row(j) / weight;
            let variance = (&second - &(&mean * &mean)).mapv(|v| v.max(0.0) + min_covar);
            self.emissions[j] = DiagonalGaussian::new(mean, variance);
        }
    }

    fn is_valid(&self) -> bool {
        self.start_prob.iter().all(|p| p.is_finite())
            && self.transmat.iter().all(|p| p.is_finite())
            && self.emissions.iter().all(DiagonalGaussian::is_valid)
    }

    fn check_input(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<()> {
        if x.ncols() != self.n_features {
            return Err(ScoreError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        check_lengths(x.nrows(), lengths).map_err(ScoreError::InvalidLengths)
    }

    /// Log-likelihood of concatenated sequences, summed over sequences
    pub fn score(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<f64> {
        self.check_input(x, lengths)?;

        let log_start = self.start_prob.mapv(f64::ln);
        let log_trans = self.transmat.mapv(f64::ln);
        let log_ll: f64 = split_sequences(x, lengths)
            .map(|seq| forward(&log_start, &log_trans, &log_emissions(seq, &self.emissions)).1)
            .sum();

        if log_ll.is_nan() {
            return Err(ScoreError::NonFinite);
        }
        Ok(log_ll)
    }

    /// Most likely state path (Viterbi) for each sequence, concatenated
    ///
    /// # Returns
    /// State path over all frames and its summed log probability
    pub fn decode(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<(Vec<usize>, f64)> {
        self.check_input(x, lengths)?;

        let log_start = self.start_prob.mapv(f64::ln);
        let log_trans = self.transmat.mapv(f64::ln);
        let mut path = Vec::with_capacity(x.nrows());
        let mut log_prob = 0.0;
        for seq in split_sequences(x, lengths) {
            let log_b = log_emissions(seq, &self.emissions);
            let (seq_path, seq_prob) = viterbi(&log_start, &log_trans, &log_b);
            path.extend(seq_path);
            log_prob += seq_prob;
        }

        Ok((path, log_prob))
    }

    /// Sample a sequence from the model
    pub fn sample<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> (Vec<usize>, Array2<f64>) {
        let mut states = Vec::with_capacity(length);
        let mut observations = Array2::zeros((length, self.n_features));
        if length == 0 {
            return (states, observations);
        }

        let mut current_state = sample_discrete(self.start_prob.view(), rng);
        for t in 0..length {
            if t > 0 {
                current_state = sample_discrete(self.transmat.row(current_state), rng);
            }
            states.push(current_state);
            let obs = self.emissions[current_state].sample(rng);
            observations.row_mut(t).assign(&obs);
        }

        (states, observations)
    }

    /// Number of hidden states
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Number of features per frame
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Initial state probabilities
    pub fn start_prob(&self) -> &Array1<f64> {
        &self.start_prob
    }

    /// Get the transition matrix
    pub fn transmat(&self) -> &Array2<f64> {
        &self.transmat
    }

    /// Emission means, one row per state
    pub fn means(&self) -> Array2<f64> {
        stack_rows(self.emissions.iter().map(|e| e.mean().view()), self.n_features)
    }

    /// Emission variances, one row per state
    pub fn variances(&self) -> Array2<f64> {
        stack_rows(self.emissions.iter().map(|e| e.variance().view()), self.n_features)
    }

    /// Log-likelihood after each EM iteration
    pub fn log_likelihood_history(&self) -> &[f64] {
        &self.log_likelihood_history
    }

    /// Whether EM stopped on the tolerance rather than the iteration cap
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Views of each sequence inside a concatenated observation matrix
fn split_sequences<'a>(
    x: &'a Array2<f64>,
    lengths: &'a [usize],
) -> impl Iterator<Item = ArrayView2<'a, f64>> + 'a {
    lengths.iter().scan(0usize, move |offset, &len| {
        let start = *offset;
        *offset += len;
        Some(x.slice(s![start..start + len, ..]))
    })
}

fn stack_rows<'a>(rows: impl Iterator<Item = ArrayView1<'a, f64>>, n_cols: usize) -> Array2<f64> {
    let rows: Vec<ArrayView1<f64>> = rows.collect();
    let mut out = Array2::zeros((rows.len(), n_cols));
    for (i, row) in rows.into_iter().enumerate() {
        out.row_mut(i).assign(&row);
    }
    out
}

/// Pick `k` distinct frames as seeds, then run a few Lloyd iterations
fn kmeans_centers(x: &Array2<f64>, k: usize, n_iter: usize, rng: &mut StdRng) -> Vec<Array1<f64>> {
    let n = x.nrows();
    let mut centers: Vec<Array1<f64>> = rand::seq::index::sample(rng, n, k)
        .into_iter()
        .map(|idx| x.row(idx).to_owned())
        .collect();

    let mut assignments = vec![0; n];
    for _ in 0..n_iter {
        // Assign points to nearest center
        for (i, row) in x.rows().into_iter().enumerate() {
            let mut best_dist = f64::MAX;
            for (j, center) in centers.iter().enumerate() {
                let dist: f64 = row
                    .iter()
                    .zip(center.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                if dist < best_dist {
                    best_dist = dist;
                    assignments[i] = j;
                }
            }
        }

        // Update centers, empty clusters keep their seed
        for (j, center) in centers.iter_mut().enumerate() {
            let mut sum = Array1::zeros(x.ncols());
            let mut count = 0;
            for (i, row) in x.rows().into_iter().enumerate() {
                if assignments[i] == j {
                    sum += &row;
                    count += 1;
                }
            }
            if count > 0 {
                *center = sum / count as f64;
            }
        }
    }

    centers
}

/// Sample from discrete distribution
fn sample_discrete<R: Rng + ?Sized>(probs: ArrayView1<f64>, rng: &mut R) -> usize {
    let u: f64 = rng.gen();
    let mut cumsum = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumsum += p;
        if u < cumsum {
            return i;
        }
    }
    probs.len() - 1
}
