//! Network of phase vocoder nodes driven once per audio block.

use super::analyze::PvAnalyzer;
use super::effect::PvTransform;
use super::resynth::PvSynth;
use super::setting::{Sender, Setting};
use super::stream::PvStream;
use thingbuf::mpsc::blocking::{channel, Receiver};
use thiserror::Error;

pub type NodeIndex = usize;

/// Errors from wiring a network.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// The named node does not exist.
    #[error("node {0} does not exist")]
    Invalid(NodeIndex),
    /// A spectral consumer was wired to a node that produces no stream.
    #[error("node {0} does not produce a spectral stream")]
    NotSpectral(NodeIndex),
    /// The named node does not consume a spectral stream.
    #[error("node {0} does not consume a spectral stream")]
    NotConsumer(NodeIndex),
    /// A consumer may only read nodes wired before it.
    #[error("source {producer} does not precede node {consumer}")]
    Order {
        producer: NodeIndex,
        consumer: NodeIndex,
    },
    /// A node was built for a different audio block length than the network.
    #[error("node block size {got} does not match the network block size {expected}")]
    BlockSize { expected: usize, got: usize },
}

/// One node of the network.
#[derive(Clone)]
enum PvUnit {
    Analyzer(PvAnalyzer),
    Transform(Box<dyn PvTransform>),
    Synth(PvSynth),
}

impl PvUnit {
    fn output(&self) -> Option<&PvStream> {
        match self {
            PvUnit::Analyzer(node) => Some(node.output()),
            PvUnit::Transform(node) => Some(node.output()),
            PvUnit::Synth(_) => None,
        }
    }

    fn set(&mut self, setting: Setting) {
        match self {
            PvUnit::Analyzer(node) => node.set(setting),
            PvUnit::Transform(node) => node.set(setting),
            PvUnit::Synth(node) => node.set(setting),
        }
    }

    fn reset(&mut self) {
        match self {
            PvUnit::Analyzer(node) => node.reset(),
            PvUnit::Transform(node) => node.reset(),
            PvUnit::Synth(node) => node.reset(),
        }
    }
}

/// A node plus its wiring and control channel.
struct Vertex {
    unit: PvUnit,
    source: Option<NodeIndex>,
    playing: bool,
    sender: Sender<Setting>,
    receiver: Receiver<Setting>,
}

impl Vertex {
    fn new(unit: PvUnit, source: Option<NodeIndex>) -> Self {
        let (sender, receiver) = channel(64);
        Self {
            unit,
            source,
            playing: true,
            sender,
            receiver,
        }
    }
}

impl Clone for Vertex {
    fn clone(&self) -> Self {
        // Receivers cannot be cloned; a cloned network gets fresh control
        // channels.
        let (sender, receiver) = channel(64);
        Self {
            unit: self.unit.clone(),
            source: self.source,
            playing: self.playing,
            sender,
            receiver,
        }
    }
}

/// Network of phase vocoder nodes.
///
/// Nodes are evaluated in wiring order, once per audio block: analyzers
/// read the network input, transformers and synthesizers read the stream
/// of their source node, and playing synthesizers mix into the network
/// output. A consumer can only be wired to a node added before it, which
/// makes wiring order a valid evaluation order and rules out cycles.
///
/// ### Example
/// ```
/// use pvoc::prelude::*;
/// let mut net = PvNet::new(DEFAULT_SR, 64);
/// let anal = net
///     .push_analyzer(PvAnalyzer::new(DEFAULT_SR, 64, 1024, 4, Windower::Sine))
///     .unwrap();
/// let gate = net
///     .push_transform(Box::new(PvGate::new(64, 1024, 4, -90.0, 0.0)), anal)
///     .unwrap();
/// let synth = net
///     .push_synth(PvSynth::new(DEFAULT_SR, 1024, 4, Windower::Sine), gate)
///     .unwrap();
/// assert_eq!(synth, 2);
/// let input = [0.0; 64];
/// let mut output = [0.0; 64];
/// net.process(&input, &mut output);
/// ```
#[derive(Clone)]
pub struct PvNet {
    sample_rate: f64,
    block_size: usize,
    vertices: Vec<Vertex>,
    bus: Vec<f32>,
}

impl PvNet {
    /// Create an empty network processing blocks of `block_size` samples.
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            vertices: Vec::new(),
            bus: vec![0.0; block_size],
        }
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Audio block length in samples.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of nodes.
    #[inline]
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    /// Add an analyzer reading the network audio input.
    /// The analyzer must be built for this network's block size.
    pub fn push_analyzer(&mut self, analyzer: PvAnalyzer) -> Result<NodeIndex, NetError> {
        self.check_block(analyzer.output())?;
        Ok(self.push(PvUnit::Analyzer(analyzer), None))
    }

    /// Add a transformer consuming the spectral output of `source`.
    /// The transformer must be built for this network's block size.
    pub fn push_transform(
        &mut self,
        transform: Box<dyn PvTransform>,
        source: NodeIndex,
    ) -> Result<NodeIndex, NetError> {
        self.check_block(transform.output())?;
        self.check_spectral(source, self.vertices.len())?;
        Ok(self.push(PvUnit::Transform(transform), Some(source)))
    }

    /// Add a synthesizer consuming the spectral output of `source` and
    /// mixing into the network audio output.
    pub fn push_synth(
        &mut self,
        synth: PvSynth,
        source: NodeIndex,
    ) -> Result<NodeIndex, NetError> {
        self.check_spectral(source, self.vertices.len())?;
        Ok(self.push(PvUnit::Synth(synth), Some(source)))
    }

    /// Rebind the upstream stream of consumer `node` to `source`.
    pub fn set_source(&mut self, node: NodeIndex, source: NodeIndex) -> Result<(), NetError> {
        if node >= self.vertices.len() {
            return Err(NetError::Invalid(node));
        }
        if matches!(self.vertices[node].unit, PvUnit::Analyzer(_)) {
            return Err(NetError::NotConsumer(node));
        }
        self.check_spectral(source, node)?;
        self.vertices[node].source = Some(source);
        Ok(())
    }

    /// Let `node` run when the network processes.
    pub fn play(&mut self, node: NodeIndex) {
        self.vertices[node].playing = true;
    }

    /// Freeze `node`: it neither consumes nor publishes until played again.
    pub fn stop(&mut self, node: NodeIndex) {
        self.vertices[node].playing = false;
    }

    /// Sender for posting settings to `node` from a control thread.
    /// Settings are drained at the start of the next processed block.
    pub fn control(&self, node: NodeIndex) -> Sender<Setting> {
        self.vertices[node].sender.clone()
    }

    /// Apply a setting to `node` immediately. Call between blocks only.
    pub fn set(&mut self, node: NodeIndex, setting: Setting) {
        self.vertices[node].unit.set(setting);
    }

    /// The spectral stream published by `node`, if it produces one.
    pub fn stream(&self, node: NodeIndex) -> Option<&PvStream> {
        self.vertices[node].unit.output()
    }

    /// Reset every node to its initial state.
    pub fn reset(&mut self) {
        for vertex in &mut self.vertices {
            vertex.unit.reset();
        }
        self.bus.fill(0.0);
    }

    /// Process one audio block. `input` and `output` must both be one
    /// block long. Settings posted since the previous block are applied
    /// first, then playing nodes run in wiring order and playing
    /// synthesizers sum into `output`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), self.block_size);
        assert_eq!(output.len(), self.block_size);
        let size = self.block_size;
        for vertex in &mut self.vertices {
            while let Ok(setting) = vertex.receiver.try_recv() {
                vertex.unit.set(setting);
            }
        }
        output.fill(0.0);
        for i in 0..self.vertices.len() {
            if !self.vertices[i].playing {
                continue;
            }
            let (before, rest) = self.vertices.split_at_mut(i);
            let vertex = &mut rest[0];
            match &mut vertex.unit {
                PvUnit::Analyzer(node) => node.process(input),
                PvUnit::Transform(node) => {
                    if let Some(stream) = vertex.source.and_then(|s| before[s].unit.output()) {
                        node.process(size, stream);
                    }
                }
                PvUnit::Synth(node) => {
                    if let Some(stream) = vertex.source.and_then(|s| before[s].unit.output()) {
                        node.process(size, stream, &mut self.bus);
                        for (out, &x) in output.iter_mut().zip(self.bus.iter()) {
                            *out += x;
                        }
                    }
                }
            }
        }
    }

    fn push(&mut self, unit: PvUnit, source: Option<NodeIndex>) -> NodeIndex {
        let id = self.vertices.len();
        self.vertices.push(Vertex::new(unit, source));
        id
    }

    fn check_block(&self, stream: &PvStream) -> Result<(), NetError> {
        if stream.block_size() != self.block_size {
            return Err(NetError::BlockSize {
                expected: self.block_size,
                got: stream.block_size(),
            });
        }
        Ok(())
    }

    fn check_spectral(&self, source: NodeIndex, node: NodeIndex) -> Result<(), NetError> {
        if source >= self.vertices.len() {
            return Err(NetError::Invalid(source));
        }
        if source >= node {
            return Err(NetError::Order {
                producer: source,
                consumer: node,
            });
        }
        if self.vertices[source].unit.output().is_none() {
            return Err(NetError::NotSpectral(source));
        }
        Ok(())
    }
}
