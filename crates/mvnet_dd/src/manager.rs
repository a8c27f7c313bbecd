//! ROBDD manager.
//!
//! ```text
//! nodes:   [0] false  [1] true  [2..] (var, low, high, refs)
//! unique:  (var, low, high) -> Bdd
//! cache:   (op, a, b) -> Bdd        cleared by every collection
//! ```
//!
//! Reference counts are external only: a node survives a collection if it
//! is referenced or reachable from a referenced node. Operation results are
//! returned unreferenced and stay valid until the next collection.

use log::{debug, trace};
use mvnet_ir::DdManager;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Handle to a BDD node owned by a [`BddManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bdd(u32);

impl Bdd {
    /// The constant false function.
    pub const FALSE: Bdd = Bdd(0);
    /// The constant true function.
    pub const TRUE: Bdd = Bdd(1);

    /// Returns `true` for the two terminal nodes.
    pub fn is_constant(self) -> bool {
        self.0 < 2
    }
}

const TERMINAL_VAR: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Node {
    var: u32,
    low: Bdd,
    high: Bdd,
    refs: u32,
    live: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    op: Op,
    a: Bdd,
    b: Bdd,
}

impl CacheKey {
    fn new(op: Op, a: Bdd, b: Bdd) -> Self {
        // And and Or commute
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { op, a, b }
    }
}

/// A reduced ordered BDD manager.
///
/// Variables are ordered by creation. The manager accepts reordering
/// requests but keeps its order fixed; [`reorder`](DdManager::reorder)
/// collects garbage and counts the request.
pub struct BddManager {
    nodes: RefCell<Vec<Node>>,
    free: RefCell<Vec<u32>>,
    unique: RefCell<HashMap<(u32, Bdd, Bdd), Bdd>>,
    cache: RefCell<HashMap<CacheKey, Bdd>>,
    vars: Cell<u32>,
    reordering: Cell<bool>,
    reorder_requests: Cell<usize>,
    collections: Cell<usize>,
}

impl Default for BddManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BddManager {
    /// Creates a manager holding only the two terminals.
    pub fn new() -> Self {
        let terminal = Node {
            var: TERMINAL_VAR,
            low: Bdd::FALSE,
            high: Bdd::FALSE,
            refs: 0,
            live: true,
        };
        let mut high_terminal = terminal.clone();
        high_terminal.low = Bdd::TRUE;
        high_terminal.high = Bdd::TRUE;
        Self {
            nodes: RefCell::new(vec![terminal, high_terminal]),
            free: RefCell::new(Vec::new()),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            vars: Cell::new(0),
            reordering: Cell::new(false),
            reorder_requests: Cell::new(0),
            collections: Cell::new(0),
        }
    }

    fn node(&self, f: Bdd) -> Node {
        let nodes = self.nodes.borrow();
        let node = &nodes[f.0 as usize];
        assert!(node.live, "use of collected BDD node {}", f.0);
        node.clone()
    }

    fn var_of(&self, f: Bdd) -> u32 {
        self.nodes.borrow()[f.0 as usize].var
    }

    /// The decision variable of `f`, or `None` for a terminal.
    pub fn top_var(&self, f: Bdd) -> Option<u32> {
        (!f.is_constant()).then(|| self.var_of(f))
    }

    fn mk(&self, var: u32, low: Bdd, high: Bdd) -> Bdd {
        if low == high {
            return low;
        }
        if let Some(&f) = self.unique.borrow().get(&(var, low, high)) {
            return f;
        }
        let node = Node {
            var,
            low,
            high,
            refs: 0,
            live: true,
        };
        let f = match self.free.borrow_mut().pop() {
            Some(slot) => {
                self.nodes.borrow_mut()[slot as usize] = node;
                Bdd(slot)
            }
            None => {
                let mut nodes = self.nodes.borrow_mut();
                nodes.push(node);
                Bdd(nodes.len() as u32 - 1)
            }
        };
        self.unique.borrow_mut().insert((var, low, high), f);
        f
    }

    fn cofactors(&self, f: Bdd, var: u32) -> (Bdd, Bdd) {
        let node = self.node(f);
        if node.var == var {
            (node.low, node.high)
        } else {
            (f, f)
        }
    }

    fn apply(&self, op: Op, a: Bdd, b: Bdd) -> Bdd {
        match op {
            Op::And => {
                if a == Bdd::FALSE || b == Bdd::FALSE {
                    return Bdd::FALSE;
                }
                if a == Bdd::TRUE || a == b {
                    return b;
                }
                if b == Bdd::TRUE {
                    return a;
                }
            }
            Op::Or => {
                if a == Bdd::TRUE || b == Bdd::TRUE {
                    return Bdd::TRUE;
                }
                if a == Bdd::FALSE || a == b {
                    return b;
                }
                if b == Bdd::FALSE {
                    return a;
                }
            }
            Op::Not => {
                if a.is_constant() {
                    return if a == Bdd::TRUE { Bdd::FALSE } else { Bdd::TRUE };
                }
            }
        }
        let key = CacheKey::new(op, a, b);
        if let Some(&hit) = self.cache.borrow().get(&key) {
            return hit;
        }
        let var = self.var_of(a).min(self.var_of(b));
        let (a0, a1) = self.cofactors(a, var);
        let (b0, b1) = self.cofactors(b, var);
        let low = self.apply(op, a0, b0);
        let high = self.apply(op, a1, b1);
        let result = self.mk(var, low, high);
        self.cache.borrow_mut().insert(key, result);
        result
    }

    /// The projection function of variable `var`.
    ///
    /// # Panics
    ///
    /// Panics if the variable does not exist.
    pub fn var(&self, var: u32) -> Bdd {
        assert!(var < self.vars.get(), "unknown BDD variable {var}");
        self.mk(var, Bdd::FALSE, Bdd::TRUE)
    }

    /// Evaluates `f` under `assignment` (indexed by variable).
    pub fn eval(&self, f: Bdd, assignment: &[bool]) -> bool {
        let mut f = f;
        while !f.is_constant() {
            let node = self.node(f);
            f = if assignment[node.var as usize] {
                node.high
            } else {
                node.low
            };
        }
        f == Bdd::TRUE
    }

    /// External reference count of `f`.
    pub fn ref_count(&self, f: Bdd) -> u32 {
        self.nodes.borrow()[f.0 as usize].refs
    }

    /// Number of live nodes, terminals included.
    pub fn live_nodes(&self) -> usize {
        self.nodes.borrow().iter().filter(|n| n.live).count()
    }

    /// Number of nodes carrying an external reference.
    pub fn referenced_nodes(&self) -> usize {
        self.nodes.borrow().iter().filter(|n| n.live && n.refs > 0).count()
    }

    /// Returns `true` while reordering is enabled.
    pub fn is_reordering_enabled(&self) -> bool {
        self.reordering.get()
    }

    /// Reorder requests served while reordering was enabled.
    pub fn reorder_requests(&self) -> usize {
        self.reorder_requests.get()
    }

    /// Garbage collections run so far.
    pub fn collections(&self) -> usize {
        self.collections.get()
    }

    /// Frees every node that is neither referenced nor reachable from a
    /// referenced node. Returns the number of freed nodes.
    pub fn collect_garbage(&self) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        let mut marked = vec![false; nodes.len()];
        marked[0] = true;
        marked[1] = true;
        let mut stack: Vec<u32> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.live && n.refs > 0)
            .map(|(i, _)| i as u32)
            .collect();
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut marked[i as usize], true) {
                continue;
            }
            let node = &nodes[i as usize];
            stack.push(node.low.0);
            stack.push(node.high.0);
        }

        let mut freed = 0;
        let mut free = self.free.borrow_mut();
        let mut unique = self.unique.borrow_mut();
        for (i, node) in nodes.iter_mut().enumerate().skip(2) {
            if node.live && !marked[i] {
                node.live = false;
                unique.remove(&(node.var, node.low, node.high));
                free.push(i as u32);
                freed += 1;
            }
        }
        self.cache.borrow_mut().clear();
        self.collections.set(self.collections.get() + 1);
        trace!("bdd: collected {freed} nodes");
        freed
    }
}

impl DdManager for BddManager {
    type Ref = Bdd;

    fn new_variable(&self) -> Bdd {
        let var = self.vars.get();
        self.vars.set(var + 1);
        self.mk(var, Bdd::FALSE, Bdd::TRUE)
    }

    fn variable_count(&self) -> usize {
        self.vars.get() as usize
    }

    fn constant(&self, value: bool) -> Bdd {
        if value {
            Bdd::TRUE
        } else {
            Bdd::FALSE
        }
    }

    fn and(&self, a: Bdd, b: Bdd) -> Bdd {
        self.apply(Op::And, a, b)
    }

    fn or(&self, a: Bdd, b: Bdd) -> Bdd {
        self.apply(Op::Or, a, b)
    }

    fn not(&self, a: Bdd) -> Bdd {
        self.apply(Op::Not, a, a)
    }

    fn ref_node(&self, node: Bdd) {
        let mut nodes = self.nodes.borrow_mut();
        let n = &mut nodes[node.0 as usize];
        assert!(n.live, "ref of collected BDD node {}", node.0);
        n.refs += 1;
    }

    fn deref_node(&self, node: Bdd) {
        let mut nodes = self.nodes.borrow_mut();
        let n = &mut nodes[node.0 as usize];
        assert!(n.refs > 0, "deref of unreferenced BDD node {}", node.0);
        n.refs -= 1;
    }

    fn enable_reordering(&self) {
        self.reordering.set(true);
    }

    fn disable_reordering(&self) {
        self.reordering.set(false);
    }

    fn reorder(&self) {
        let freed = self.collect_garbage();
        if self.reordering.get() {
            self.reorder_requests.set(self.reorder_requests.get() + 1);
        }
        debug!(
            "bdd: reorder pass freed {freed} nodes, {} live",
            self.live_nodes()
        );
    }

    fn sharing_size(&self, roots: &[Bdd]) -> usize {
        let mut seen = HashSet::new();
        let mut stack: Vec<Bdd> = roots.to_vec();
        while let Some(f) = stack.pop() {
            if !seen.insert(f) || f.is_constant() {
                continue;
            }
            let node = self.node(f);
            stack.push(node.low);
            stack.push(node.high);
        }
        seen.len()
    }
}
