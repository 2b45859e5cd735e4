use thiserror::Error;

/// Identifies a buffer allocated on a [`ComputeDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub usize);

/// The contents of a device buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum BufferData {
    Int(Vec<i32>),
    Double(Vec<f64>),
}

impl BufferData {
    pub fn len(&self) -> usize {
        match self {
            BufferData::Int(values) => values.len(),
            BufferData::Double(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BufferData::Int(_) => "int",
            BufferData::Double(_) => "double",
        }
    }
}

/// An argument of a kernel launch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelArgument {
    Buffer(BufferHandle),
    Ulong(u64),
    Double(f64),
}

/// How many instances of a kernel are launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkSize {
    /// A single instance.
    Task,
    /// One instance for every global id in `0..n`.
    OneDimensional(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("the device has no kernel named '{0}'")]
    UnknownKernel(String),
    #[error("buffer {0} does not exist on the device")]
    UnknownBuffer(usize),
    #[error("kernel '{kernel}' takes {expected} arguments, {found} were provided")]
    ArgumentCount {
        kernel: String,
        expected: usize,
        found: usize,
    },
    #[error("argument {position} of kernel '{kernel}' should be a {expected}")]
    ArgumentType {
        kernel: String,
        position: usize,
        expected: &'static str,
    },
    #[error("buffer {handle} holds {found} values, expected {expected} values")]
    BufferType {
        handle: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("buffer {handle} has length {found}, expected {expected}")]
    BufferSize {
        handle: usize,
        expected: usize,
        found: usize,
    },
    #[error("kernel '{kernel}' cannot be launched with work size {work_size:?}")]
    WorkSize { kernel: String, work_size: WorkSize },
}

/// A device which runs the named kernels of the constraint solver over buffers it owns.
///
/// Launches are blocking: when [`ComputeDevice::run_kernel`] returns, every instance of the
/// kernel has finished and its writes are visible to [`ComputeDevice::read_buffer`].
pub trait ComputeDevice {
    fn name(&self) -> &str;

    fn create_buffer(&mut self, data: BufferData) -> Result<BufferHandle, DeviceError>;

    /// Replace the contents of a buffer; the type and length have to match.
    fn write_buffer(&mut self, handle: BufferHandle, data: BufferData) -> Result<(), DeviceError>;

    fn read_buffer(&self, handle: BufferHandle) -> Result<BufferData, DeviceError>;

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), DeviceError>;

    fn run_kernel(
        &mut self,
        name: &str,
        arguments: &[KernelArgument],
        work_size: WorkSize,
    ) -> Result<(), DeviceError>;
}
