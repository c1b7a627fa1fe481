//! Heaviest-first nested reports of accumulated cycles.

use std::cmp::Reverse;
use std::fmt;
use std::fs;
use std::mem;
use std::path::Path;

use foldhash::{HashMap, HashMapExt};

use crate::Registry;
use crate::error::Result;

/// Width of the name column of the text report, in characters.
///
/// Names (including their indentation) that are longer than this push the remaining
/// columns of their row to the right instead of being cut off.
pub const NAME_COLUMN_WIDTH: usize = 40;

/// Indentation prepended to a region name for each level of nesting.
const INDENT: &str = "    ";

const SECONDS_COLUMN_WIDTH: usize = 8;

const SEPARATOR: &str =
    "----------------------------------------------------------------------------------";

/// A snapshot of the cycles accumulated by the regions of a profiler.
///
/// Regions are ordered depth-first: each region is immediately followed by the regions
/// nested inside it, and regions sharing a parent are ordered by descending cycle count,
/// ties going to the region registered first.
///
/// For human-readable output, use the `Display` trait implementation, which renders a
/// text table with four spaces of indentation per nesting level:
///
/// ```text
/// Name                                    Seconds  : CPU Cycles
/// ----------------------------------------------------------------------------------
/// frame                                   0.500000 : 1500000000
///     physics                             0.300000 : 900000000
///     render                              0.200000 : 600000000
/// ```
///
/// The seconds column shows `-` if the profiler was not calibrated.
///
/// # Merging reports
///
/// Each thread has its own profiler. Reports from several threads can be merged, combining
/// regions that have the same name and the same chain of ancestors.
///
/// ```
/// use std::thread;
///
/// use cycle_tree::Report;
///
/// # fn main() -> Result<(), cycle_tree::Error> {
/// let work = || -> Result<Report, cycle_tree::Error> {
///     let span = cycle_tree::enter(cycle_tree::region("work")?)?;
///     std::hint::black_box(42 * 2);
///     drop(span);
///     Ok(cycle_tree::report())
/// };
///
/// let local = work()?;
/// let remote = thread::spawn(work).join().unwrap()?;
///
/// let merged = Report::merge(&local, &remote);
/// merged.print_to_stdout();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Report {
    // Depth-first, heaviest first among siblings.
    regions: Box<[ReportRegion]>,

    cycles_per_second: Option<f64>,
}

/// Accumulated cycles of a single region in a [`Report`].
#[derive(Clone, Debug)]
pub struct ReportRegion {
    name: String,
    depth: usize,
    total_cycles: u64,

    // Index of the parent in the report, always lower than the index of this region.
    parent: Option<usize>,

    parent_cycles: u64,
    root_cycles: u64,
    seconds: Option<f64>,
}

/// A region before ordering. `parent` indexes into the same list of nodes.
#[derive(Debug)]
struct Node {
    name: String,
    total_cycles: u64,
    parent: Option<usize>,
}

impl Report {
    pub(crate) fn from_registry(registry: &Registry, cycles_per_second: Option<f64>) -> Self {
        // Registry index to node index, for regions that made it into the report. Filled
        // completely before resolving parents, as a parent may be registered after its child.
        let mut node_indexes = vec![None; registry.len()];
        let entered: Vec<_> = registry
            .iter()
            .filter(|(_, region)| region.entered)
            .collect();

        for (node_index, (id, _)) in entered.iter().enumerate() {
            if let Some(slot) = node_indexes.get_mut(id.index()) {
                *slot = Some(node_index);
            }
        }

        let nodes = entered
            .into_iter()
            .map(|(_, region)| Node {
                name: region.name.clone(),
                total_cycles: region.total_cycles,
                parent: region
                    .parent
                    .and_then(|parent| node_indexes.get(parent.index()).copied().flatten()),
            })
            .collect();

        Self::from_nodes(nodes, cycles_per_second)
    }

    fn from_nodes(nodes: Vec<Node>, cycles_per_second: Option<f64>) -> Self {
        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();

        for (index, node) in nodes.iter().enumerate() {
            match node.parent.and_then(|parent| children.get_mut(parent)) {
                Some(siblings) => siblings.push(index),
                None => roots.push(index),
            }
        }

        let cycles_of = |index: usize| nodes.get(index).map_or(0, |node| node.total_cycles);

        // Stable sort, so equal cycle counts keep their order of first appearance.
        roots.sort_by_key(|&index| Reverse(cycles_of(index)));
        for siblings in &mut children {
            siblings.sort_by_key(|&index| Reverse(cycles_of(index)));
        }

        let mut walk = Walk {
            nodes,
            children,
            regions: Vec::new(),
            cycles_per_second,
        };

        for root in roots {
            walk.visit(root, 0, None);
        }

        Self {
            regions: walk.regions.into_boxed_slice(),
            cycles_per_second,
        }
    }

    /// Merges two reports into a new report.
    ///
    /// Regions with the same name whose ancestors have the same names are combined by adding
    /// their cycles. Other regions are carried over unchanged. The calibration of `a` is
    /// used for converting cycles to seconds, falling back to that of `b`.
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut nodes = a
            .regions
            .iter()
            .map(|region| Node {
                name: region.name.clone(),
                total_cycles: region.total_cycles,
                parent: region.parent,
            })
            .collect::<Vec<_>>();

        let mut index_by_path = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_path
                .entry((node.parent, node.name.clone()))
                .or_insert(index);
        }

        // Index in `b` to index in `nodes`. Parents come before their children in `b`.
        let mut merged_indexes = Vec::with_capacity(b.regions.len());

        for region in &b.regions {
            let parent = region
                .parent
                .and_then(|parent| merged_indexes.get(parent).copied());
            let path = (parent, region.name.clone());

            let merged_index = match index_by_path.get(&path).copied() {
                Some(index) => {
                    if let Some(node) = nodes.get_mut(index) {
                        node.total_cycles = node.total_cycles.saturating_add(region.total_cycles);
                    }
                    index
                }
                None => {
                    let index = nodes.len();
                    nodes.push(Node {
                        name: region.name.clone(),
                        total_cycles: region.total_cycles,
                        parent,
                    });
                    index_by_path.insert(path, index);
                    index
                }
            };

            merged_indexes.push(merged_index);
        }

        Self::from_nodes(nodes, a.cycles_per_second.or(b.cycles_per_second))
    }

    /// Iterates through the regions in report order.
    ///
    /// # Example
    ///
    /// ```
    /// use cycle_tree::Profiler;
    ///
    /// # fn main() -> Result<(), cycle_tree::Error> {
    /// let profiler = Profiler::new();
    /// let parse = profiler.register("parse")?;
    /// drop(profiler.enter(parse)?);
    ///
    /// for region in profiler.report().regions() {
    ///     println!(
    ///         "{} at depth {} took {} cycles",
    ///         region.name(),
    ///         region.depth(),
    ///         region.total_cycles()
    ///     );
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn regions(&self) -> impl Iterator<Item = &ReportRegion> {
        self.regions.iter()
    }

    /// Whether the report contains no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The factor used to convert cycles to seconds, if the profiler was calibrated.
    #[must_use]
    pub fn cycles_per_second(&self) -> Option<f64> {
        self.cycles_per_second
    }

    /// Prints the report to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        print!("{self}");
    }

    /// Writes the report to a file, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

#[derive(Debug)]
struct Walk {
    nodes: Vec<Node>,
    children: Vec<Vec<usize>>,
    regions: Vec<ReportRegion>,
    cycles_per_second: Option<f64>,
}

impl Walk {
    /// Emits a node, then all nodes nested inside it, heaviest first.
    fn visit(&mut self, index: usize, depth: usize, parent: Option<usize>) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };

        let total_cycles = node.total_cycles;
        let name = mem::take(&mut node.name);

        let (parent_cycles, root_cycles) = parent
            .and_then(|parent| self.regions.get(parent))
            .map_or((total_cycles, total_cycles), |parent| {
                (parent.total_cycles, parent.root_cycles)
            });

        let report_index = self.regions.len();
        self.regions.push(ReportRegion {
            name,
            depth,
            total_cycles,
            parent,
            parent_cycles,
            root_cycles,
            seconds: self
                .cycles_per_second
                .map(|cycles_per_second| cycles_to_seconds(total_cycles, cycles_per_second)),
        });

        let children = self
            .children
            .get_mut(index)
            .map(mem::take)
            .unwrap_or_default();

        for child in children {
            self.visit(child, depth.saturating_add(1), Some(report_index));
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "cycle counts beyond 2^52 lose precision we do not need for display"
)]
fn cycles_to_seconds(cycles: u64, cycles_per_second: f64) -> f64 {
    cycles as f64 / cycles_per_second
}

#[expect(
    clippy::cast_precision_loss,
    reason = "cycle counts beyond 2^52 lose precision we do not need for display"
)]
fn percentage(part: u64, whole: u64) -> Option<f64> {
    (whole != 0).then(|| 100.0 * part as f64 / whole as f64)
}

impl ReportRegion {
    /// The name of the region.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nesting level of the region, zero for regions not started inside any other region.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Cycles accumulated by the region.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Accumulated cycles converted to seconds, if the profiler was calibrated.
    #[must_use]
    pub fn seconds(&self) -> Option<f64> {
        self.seconds
    }

    /// Share of the region's top-level ancestor taken up by this region, in percent.
    ///
    /// 100 for top-level regions. `None` if the top-level ancestor has no cycles.
    #[must_use]
    pub fn percent_of_total(&self) -> Option<f64> {
        percentage(self.total_cycles, self.root_cycles)
    }

    /// Share of the region's direct parent taken up by this region, in percent.
    ///
    /// 100 for top-level regions. `None` if the parent has no cycles.
    #[must_use]
    pub fn percent_of_parent(&self) -> Option<f64> {
        percentage(self.total_cycles, self.parent_cycles)
    }
}

impl fmt::Display for ReportRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}{}", INDENT.repeat(self.depth), self.name);

        match self.seconds {
            Some(seconds) => write!(
                f,
                "{label:<name_width$}{seconds:<seconds_width$.6} : {}",
                self.total_cycles,
                name_width = NAME_COLUMN_WIDTH,
                seconds_width = SECONDS_COLUMN_WIDTH,
            ),
            None => write!(
                f,
                "{label:<name_width$}{:<seconds_width$} : {}",
                "-",
                self.total_cycles,
                name_width = NAME_COLUMN_WIDTH,
                seconds_width = SECONDS_COLUMN_WIDTH,
            ),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<name_width$}{:<seconds_width$} : {}",
            "Name",
            "Seconds",
            "CPU Cycles",
            name_width = NAME_COLUMN_WIDTH,
            seconds_width = SECONDS_COLUMN_WIDTH,
        )?;
        writeln!(f, "{SEPARATOR}")?;

        for region in &self.regions {
            writeln!(f, "{region}")?;
        }

        Ok(())
    }
}
