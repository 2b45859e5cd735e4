use std::mem;

use log::trace;

use super::device::BufferData;
use super::device::BufferHandle;
use super::device::ComputeDevice;
use super::device::DeviceError;
use super::device::KernelArgument;
use super::device::WorkSize;
use super::kernels;
use super::kernels::KernelProblem;

/// A [`ComputeDevice`] which keeps its buffers in host memory and runs every kernel instance on
/// the calling thread, in global id order.
#[derive(Debug, Default)]
pub struct HostDevice {
    buffers: Vec<Option<BufferData>>,
}

impl HostDevice {
    pub fn new() -> HostDevice {
        HostDevice::default()
    }

    /// The number of buffers which were created and not yet released.
    pub fn num_live_buffers(&self) -> usize {
        self.buffers.iter().filter(|buffer| buffer.is_some()).count()
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&BufferData, DeviceError> {
        self.buffers
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(DeviceError::UnknownBuffer(handle.0))
    }

    fn int_buffer(&self, handle: BufferHandle) -> Result<&[i32], DeviceError> {
        match self.buffer(handle)? {
            BufferData::Int(values) => Ok(values),
            other => Err(buffer_type_error(handle, "int", other)),
        }
    }

    fn double_buffer(&self, handle: BufferHandle) -> Result<&[f64], DeviceError> {
        match self.buffer(handle)? {
            BufferData::Double(values) => Ok(values),
            other => Err(buffer_type_error(handle, "double", other)),
        }
    }

    /// Move an int buffer out of the device so that a kernel can write to it while reading the
    /// other buffers. It has to be given back with [`HostDevice::restore_int_buffer`].
    fn take_int_buffer(&mut self, handle: BufferHandle) -> Result<Vec<i32>, DeviceError> {
        let slot = self
            .buffers
            .get_mut(handle.0)
            .ok_or(DeviceError::UnknownBuffer(handle.0))?;

        match slot.take() {
            Some(BufferData::Int(values)) => Ok(values),
            Some(other) => {
                let error = buffer_type_error(handle, "int", &other);
                *slot = Some(other);
                Err(error)
            }
            None => Err(DeviceError::UnknownBuffer(handle.0)),
        }
    }

    fn restore_int_buffer(&mut self, handle: BufferHandle, values: Vec<i32>) {
        self.buffers[handle.0] = Some(BufferData::Int(values));
    }

    /// Read the arguments describing the problem, starting at argument `first`.
    fn problem(
        &self,
        arguments: &Arguments<'_>,
        first: usize,
    ) -> Result<KernelProblem<'_>, DeviceError> {
        let left = arguments.buffer(first)?;
        let right = arguments.buffer(first + 1)?;
        let min_pixels = arguments.buffer(first + 2)?;
        let min_edges = arguments.buffer(first + 3)?;
        let reparametrization = arguments.buffer(first + 4)?;
        let height = arguments.ulong(first + 5)? as usize;
        let width = arguments.ulong(first + 6)? as usize;
        let _max_value = arguments.ulong(first + 7)?;
        let levels = arguments.ulong(first + 8)? as usize;

        let problem = KernelProblem {
            left: self.int_buffer(left)?,
            right: self.int_buffer(right)?,
            min_pixels: self.double_buffer(min_pixels)?,
            min_edges: self.double_buffer(min_edges)?,
            reparametrization: self.double_buffer(reparametrization)?,
            height,
            width,
            levels,
            threshold: arguments.double(first + 9)?,
            cleanness: arguments.double(first + 10)?,
            smoothness: arguments.double(first + 11)?,
        };

        let num_pixels = problem.num_pixels();
        let num_nodes = problem.num_nodes();
        check_len(left, problem.left.len(), num_pixels)?;
        check_len(right, problem.right.len(), num_pixels)?;
        check_len(min_pixels, problem.min_pixels.len(), num_pixels)?;
        check_len(min_edges, problem.min_edges.len(), num_pixels * 4)?;
        check_len(
            reparametrization,
            problem.reparametrization.len(),
            num_nodes * 4,
        )?;

        Ok(problem)
    }

    fn run_csp_iteration(
        &mut self,
        arguments: &Arguments<'_>,
        work_size: WorkSize,
    ) -> Result<(), DeviceError> {
        let WorkSize::OneDimensional(num_instances) = work_size else {
            return Err(arguments.work_size_error(work_size));
        };

        let availability_handle = arguments.buffer(0)?;
        let changed_handle = arguments.buffer(1)?;
        let mut availability = self.take_int_buffer(availability_handle)?;
        let mut changed = match self.take_int_buffer(changed_handle) {
            Ok(changed) => changed,
            Err(error) => {
                self.restore_int_buffer(availability_handle, availability);
                return Err(error);
            }
        };

        let result = self.problem(arguments, 2).and_then(|problem| {
            check_len(availability_handle, availability.len(), problem.num_nodes())?;
            check_len(changed_handle, changed.len(), 1)?;

            for global_id in 0..num_instances {
                kernels::csp_iteration(&problem, &mut availability, &mut changed, global_id);
            }
            Ok(())
        });

        self.restore_int_buffer(availability_handle, availability);
        self.restore_int_buffer(changed_handle, changed);
        result
    }

    fn run_choose_best_node(
        &mut self,
        arguments: &Arguments<'_>,
        work_size: WorkSize,
    ) -> Result<(), DeviceError> {
        if work_size != WorkSize::Task {
            return Err(arguments.work_size_error(work_size));
        }

        let availability_handle = arguments.buffer(0)?;
        let x = arguments.ulong(kernels::CHOOSE_BEST_NODE_ARITY - 2)? as usize;
        let y = arguments.ulong(kernels::CHOOSE_BEST_NODE_ARITY - 1)? as usize;
        let mut availability = self.take_int_buffer(availability_handle)?;

        let result = self.problem(arguments, 1).and_then(|problem| {
            check_len(availability_handle, availability.len(), problem.num_nodes())?;

            kernels::choose_best_node(&problem, &mut availability, x, y);
            Ok(())
        });

        self.restore_int_buffer(availability_handle, availability);
        result
    }
}

impl ComputeDevice for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    /// Released slots are handed out again before the storage grows.
    fn create_buffer(&mut self, data: BufferData) -> Result<BufferHandle, DeviceError> {
        match self.buffers.iter().position(Option::is_none) {
            Some(index) => {
                self.buffers[index] = Some(data);
                Ok(BufferHandle(index))
            }
            None => {
                self.buffers.push(Some(data));
                Ok(BufferHandle(self.buffers.len() - 1))
            }
        }
    }

    fn write_buffer(&mut self, handle: BufferHandle, data: BufferData) -> Result<(), DeviceError> {
        let slot = self
            .buffers
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(DeviceError::UnknownBuffer(handle.0))?;

        if mem::discriminant(&*slot) != mem::discriminant(&data) {
            return Err(buffer_type_error(handle, slot.type_name(), &data));
        }
        check_len(handle, data.len(), slot.len())?;

        *slot = data;
        Ok(())
    }

    fn read_buffer(&self, handle: BufferHandle) -> Result<BufferData, DeviceError> {
        self.buffer(handle).cloned()
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), DeviceError> {
        self.buffers
            .get_mut(handle.0)
            .and_then(Option::take)
            .map(|_| ())
            .ok_or(DeviceError::UnknownBuffer(handle.0))
    }

    fn run_kernel(
        &mut self,
        name: &str,
        arguments: &[KernelArgument],
        work_size: WorkSize,
    ) -> Result<(), DeviceError> {
        trace!("Running kernel '{name}' with work size {work_size:?}");

        let arguments = Arguments {
            kernel: name,
            arguments,
        };
        match name {
            kernels::CSP_ITERATION => {
                arguments.expect_count(kernels::CSP_ITERATION_ARITY)?;
                self.run_csp_iteration(&arguments, work_size)
            }
            kernels::CHOOSE_BEST_NODE => {
                arguments.expect_count(kernels::CHOOSE_BEST_NODE_ARITY)?;
                self.run_choose_best_node(&arguments, work_size)
            }
            _ => Err(DeviceError::UnknownKernel(name.to_owned())),
        }
    }
}

/// The arguments of a single kernel launch, read by position.
#[derive(Debug)]
struct Arguments<'k> {
    kernel: &'k str,
    arguments: &'k [KernelArgument],
}

impl Arguments<'_> {
    fn expect_count(&self, expected: usize) -> Result<(), DeviceError> {
        if self.arguments.len() == expected {
            Ok(())
        } else {
            Err(DeviceError::ArgumentCount {
                kernel: self.kernel.to_owned(),
                expected,
                found: self.arguments.len(),
            })
        }
    }

    fn buffer(&self, position: usize) -> Result<BufferHandle, DeviceError> {
        match self.arguments.get(position) {
            Some(KernelArgument::Buffer(handle)) => Ok(*handle),
            _ => Err(self.type_error(position, "buffer")),
        }
    }

    fn ulong(&self, position: usize) -> Result<u64, DeviceError> {
        match self.arguments.get(position) {
            Some(KernelArgument::Ulong(value)) => Ok(*value),
            _ => Err(self.type_error(position, "ulong")),
        }
    }

    fn double(&self, position: usize) -> Result<f64, DeviceError> {
        match self.arguments.get(position) {
            Some(KernelArgument::Double(value)) => Ok(*value),
            _ => Err(self.type_error(position, "double")),
        }
    }

    fn type_error(&self, position: usize, expected: &'static str) -> DeviceError {
        DeviceError::ArgumentType {
            kernel: self.kernel.to_owned(),
            position,
            expected,
        }
    }

    fn work_size_error(&self, work_size: WorkSize) -> DeviceError {
        DeviceError::WorkSize {
            kernel: self.kernel.to_owned(),
            work_size,
        }
    }
}

fn buffer_type_error(
    handle: BufferHandle,
    expected: &'static str,
    found: &BufferData,
) -> DeviceError {
    DeviceError::BufferType {
        handle: handle.0,
        expected,
        found: found.type_name(),
    }
}

fn check_len(handle: BufferHandle, found: usize, expected: usize) -> Result<(), DeviceError> {
    if found == expected {
        Ok(())
    } else {
        Err(DeviceError::BufferSize {
            handle: handle.0,
            expected,
            found,
        })
    }
}
