//! Standard Workload Set
//!
//! The candidate operations the board times: a comparison sort, a blocked
//! matrix multiplication and a batch of binary searches. Each runner is a
//! pure function taking an owned copy of its input and returning the
//! number of elementary operations performed, so repeated runs can never
//! leak mutation into each other and throughput falls out of the count.

use std::hint::black_box;

/// Reversed-range size for the sort workload.
const SORT_SIZE: u64 = 50;
/// Square dimension for the matrix workload.
const MATRIX_DIM: usize = 50;
/// Cache-friendly block edge for the matrix workload.
const MATRIX_BLOCK: usize = 64;
/// Haystack size for the search workload.
const SEARCH_SPACE: u64 = 100_000;
/// Number of deterministic lookups per search run.
const SEARCH_COUNT: u64 = 25;

/// Input to a workload runner. Cloned fresh for every run.
#[derive(Debug, Clone)]
pub enum WorkloadInput {
    /// Descending values for the sort
    Unsorted(Vec<u64>),
    /// Matrix dimension; the matrices are built inside the run
    MatrixDim(usize),
    /// Sorted haystack plus lookup targets
    SearchSet {
        /// Ascending values searched against
        haystack: Vec<u64>,
        /// Values to look up
        targets: Vec<u64>,
    },
}

/// One benchmarkable operation.
pub struct Workload {
    /// Stable identifier (used for filtering and report keys)
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Input cloned for each run
    pub input: WorkloadInput,
    /// Counting runner; returns elementary operations performed
    pub runner: fn(WorkloadInput) -> u64,
}

/// The board's standard workload set.
pub fn standard_workloads() -> Vec<Workload> {
    vec![
        Workload {
            id: "bubble_sort",
            name: "Bubble Sort",
            input: WorkloadInput::Unsorted((1..=SORT_SIZE).rev().collect()),
            runner: bubble_sort_counted,
        },
        Workload {
            id: "matrix_mult",
            name: "Matrix Multiplication",
            input: WorkloadInput::MatrixDim(MATRIX_DIM),
            runner: matrix_multiply_counted,
        },
        Workload {
            id: "binary_search",
            name: "Binary Search",
            input: WorkloadInput::SearchSet {
                haystack: (0..SEARCH_SPACE).collect(),
                targets: (0..SEARCH_COUNT)
                    .map(|i| i * (SEARCH_SPACE / SEARCH_COUNT))
                    .collect(),
            },
            runner: binary_search_counted,
        },
    ]
}

/// Bubble sort with early termination. Counts comparisons and swaps.
fn bubble_sort_counted(input: WorkloadInput) -> u64 {
    let WorkloadInput::Unsorted(mut arr) = input else {
        return 0;
    };
    let n = arr.len();
    let mut operations = 0u64;

    for i in 0..n {
        let mut swapped = false;
        for j in 0..n - i - 1 {
            operations += 1;
            if arr[j] > arr[j + 1] {
                arr.swap(j, j + 1);
                operations += 1;
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }

    black_box(&arr);
    operations
}

/// Blocked matrix multiplication. Counts one multiply and one add per
/// inner step.
fn matrix_multiply_counted(input: WorkloadInput) -> u64 {
    let WorkloadInput::MatrixDim(n) = input else {
        return 0;
    };
    let a: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| (i * j + 1) as f64).collect())
        .collect();
    let b: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| (i + j + 1) as f64).collect())
        .collect();
    let mut c = vec![vec![0.0f64; n]; n];

    let block = MATRIX_BLOCK.min(n.max(1));
    let mut operations = 0u64;

    for ii in (0..n).step_by(block) {
        for jj in (0..n).step_by(block) {
            for kk in (0..n).step_by(block) {
                let i_max = (ii + block).min(n);
                let j_max = (jj + block).min(n);
                let k_max = (kk + block).min(n);
                for i in ii..i_max {
                    for j in jj..j_max {
                        let mut sum = c[i][j];
                        for k in kk..k_max {
                            sum += a[i][k] * b[k][j];
                            operations += 2;
                        }
                        c[i][j] = sum;
                    }
                }
            }
        }
    }

    black_box(&c);
    operations
}

/// Repeated binary search over a sorted haystack. Counts comparisons.
fn binary_search_counted(input: WorkloadInput) -> u64 {
    let WorkloadInput::SearchSet { haystack, targets } = input else {
        return 0;
    };
    let mut operations = 0u64;

    for target in &targets {
        let mut left = 0usize;
        let mut right = haystack.len().saturating_sub(1);
        while left <= right {
            let mid = (left + right) >> 1;
            operations += 1;
            match haystack[mid].cmp(target) {
                std::cmp::Ordering::Equal => break,
                std::cmp::Ordering::Less => left = mid + 1,
                std::cmp::Ordering::Greater => {
                    if mid == 0 {
                        break;
                    }
                    right = mid - 1;
                }
            }
        }
    }

    black_box(operations)
}
