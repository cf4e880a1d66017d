use crate::toolkit::error::{
    TextPosition, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind,
};
use oxrdf::Quad;
use std::collections::VecDeque;

/// A cooperative quad producer.
///
/// A producer owns its control flow and pushes quads into the sink at
/// arbitrary depths of its own call stack. It is resumed step by step by an
/// [`EmissionDriver`], one top-level unit of work (typically a statement) per
/// [`step`](QuadProducer::step) call.
pub trait QuadProducer {
    /// Parses the next unit of input, pushing the quads it yields into `sink`.
    ///
    /// Returns `false` once the input is exhausted.
    fn step(&mut self, sink: &mut VecDeque<Quad>) -> Result<bool, TurtleParseError>;
}

enum DriverState {
    Ready,
    Claimed,
    Finished,
    Failed,
}

/// Adapts a [`QuadProducer`] into a pull-based sequence of quads.
///
/// The driver resumes the producer whenever its queue runs dry and hands the
/// buffered quads out one per pull, in emission order. A producer failure is
/// terminal: it is reported once and every later pull sees the end of the
/// sequence. The quads can only be pulled in a single pass: iterating a
/// driver a second time yields a
/// [`TurtleSyntaxErrorKind::AlreadyConsumed`] failure.
pub struct EmissionDriver<P: QuadProducer> {
    producer: P,
    queue: VecDeque<Quad>,
    state: DriverState,
}

impl<P: QuadProducer> EmissionDriver<P> {
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            queue: VecDeque::new(),
            state: DriverState::Ready,
        }
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn next_quad(&mut self) -> Option<Result<Quad, TurtleParseError>> {
        loop {
            if let Some(quad) = self.queue.pop_front() {
                return Some(Ok(quad));
            }
            match self.state {
                DriverState::Finished | DriverState::Failed => return None,
                DriverState::Ready => self.state = DriverState::Claimed,
                DriverState::Claimed => (),
            }
            match self.producer.step(&mut self.queue) {
                Ok(true) => (),
                Ok(false) => {
                    self.state = DriverState::Finished;
                    return self.queue.pop_front().map(Ok);
                }
                Err(e) => {
                    self.state = DriverState::Failed;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<'a, P: QuadProducer> IntoIterator for &'a mut EmissionDriver<P> {
    type Item = Result<Quad, TurtleParseError>;
    type IntoIter = Quads<'a, P>;

    /// Claims the unique pull pass over the producer.
    fn into_iter(self) -> Quads<'a, P> {
        let pass = if matches!(self.state, DriverState::Ready) {
            self.state = DriverState::Claimed;
            PassState::Granted
        } else {
            PassState::Denied
        };
        Quads { driver: self, pass }
    }
}

enum PassState {
    Granted,
    Denied,
    Spent,
}

/// A pull pass over an [`EmissionDriver`].
pub struct Quads<'a, P: QuadProducer> {
    driver: &'a mut EmissionDriver<P>,
    pass: PassState,
}

impl<P: QuadProducer> Iterator for Quads<'_, P> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pass {
            PassState::Granted => self.driver.next_quad(),
            PassState::Denied => {
                self.pass = PassState::Spent;
                Some(Err(TurtleSyntaxError::new(
                    TurtleSyntaxErrorKind::AlreadyConsumed,
                    TextPosition::default()..TextPosition::default(),
                )
                .into()))
            }
            PassState::Spent => None,
        }
    }
}
