use crate::device::{BufferId, GraphicsApi, ProgramId};

/// GPU objects a frame driver draws with every tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawResources {
    pub program: ProgramId,
    /// Array buffer holding the vertex data. Attribute pointers into it are
    /// part of the context state and were set up when it was filled.
    pub buffer: BufferId,
    pub vertex_count: u32,
}

impl DrawResources {
    /// Deletes the program and the buffer.
    pub fn release<A: GraphicsApi + ?Sized>(self, api: &mut A) {
        api.delete_buffer(self.buffer);
        api.delete_program(self.program);
        log::debug!(
            "released program {} and buffer {}",
            self.program.raw(),
            self.buffer.raw()
        );
    }
}
