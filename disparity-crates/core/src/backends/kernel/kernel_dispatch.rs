use log::debug;
use log::trace;

use super::device::BufferData;
use super::device::BufferHandle;
use super::device::ComputeDevice;
use super::device::DeviceError;
use super::device::KernelArgument;
use super::device::WorkSize;
use super::kernels::CHOOSE_BEST_NODE;
use super::kernels::CSP_ITERATION;
use crate::backends::csp_backend::conclude_relaxation;
use crate::backends::BackendStatistics;
use crate::backends::CspBackend;
use crate::basic_types::Image;
use crate::basic_types::LabelingError;
use crate::basic_types::Pixel;
use crate::disparity_assert_simple;
use crate::engine::ConstraintGraph;
use crate::engine::DisparityGraph;

/// Runs the relaxation as kernels on a [`ComputeDevice`].
///
/// Every call uploads the problem, runs the `csp_iteration` kernel over all nodes until it
/// reports no change and reads the availability back into the graph. Labeling runs entirely on
/// the device: for every pixel in raster order, a `choose_best_node_gpu` task fixes the pixel and
/// the relaxation is repeated.
#[derive(Debug)]
pub struct KernelDispatch<D> {
    device: D,
    statistics: BackendStatistics,
}

impl<D: ComputeDevice> KernelDispatch<D> {
    pub fn new(device: D) -> KernelDispatch<D> {
        KernelDispatch {
            device,
            statistics: BackendStatistics::default(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Launch `csp_iteration` until a launch removes nothing.
    fn propagate(&mut self, problem: &DeviceProblem) -> Result<(), DeviceError> {
        self.statistics.csp_solves += 1;
        let arguments = problem.csp_iteration_arguments();
        let work_size = WorkSize::OneDimensional(problem.num_nodes);

        loop {
            self.device
                .write_buffer(problem.changed, BufferData::Int(vec![0]))?;
            self.device.run_kernel(CSP_ITERATION, &arguments, work_size)?;
            self.statistics.relaxation_rounds += 1;

            let changed = read_int_buffer(&self.device, problem.changed)?;
            trace!("Kernel relaxation round changed: {changed:?}");
            if changed.first().copied().unwrap_or(0) == 0 {
                return Ok(());
            }
        }
    }

    fn label(
        &mut self,
        problem: &DeviceProblem,
        graph: &DisparityGraph,
    ) -> Result<(), DeviceError> {
        for pixel in graph.pixels() {
            self.device.run_kernel(
                CHOOSE_BEST_NODE,
                &problem.choose_best_node_arguments(pixel),
                WorkSize::Task,
            )?;
            self.propagate(problem)?;
        }

        Ok(())
    }

    /// Run `work` on the uploaded problem and copy the resulting availability into `graph`.
    ///
    /// The buffers are released whether or not `work` succeeds.
    fn run_on_device(
        &mut self,
        graph: &mut ConstraintGraph<'_>,
        work: impl FnOnce(&mut Self, &DeviceProblem, &DisparityGraph) -> Result<(), DeviceError>,
    ) -> Result<(), DeviceError> {
        let available_before = graph.count_available_nodes();
        let problem = DeviceProblem::upload(&mut self.device, graph)?;

        let outcome = work(self, &problem, graph.disparity_graph())
            .and_then(|()| read_int_buffer(&self.device, problem.availability));
        problem.release(&mut self.device)?;

        let availability = outcome?
            .into_iter()
            .map(|available| available != 0)
            .collect::<Vec<_>>();
        graph.set_availability(&availability);

        let removed = available_before - graph.count_available_nodes();
        self.statistics.removed_nodes += removed as u64;
        Ok(())
    }
}

impl<D: ComputeDevice> CspBackend for KernelDispatch<D> {
    fn name(&self) -> &'static str {
        "kernel-dispatch"
    }

    fn solve_csp(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<bool, LabelingError> {
        self.run_on_device(graph, |backend, problem, _| backend.propagate(problem))?;

        Ok(conclude_relaxation(graph))
    }

    fn find_labeling(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<(), LabelingError> {
        debug!("Labeling on device '{}'", self.device.name());
        self.run_on_device(graph, |backend, problem, disparity_graph| {
            backend.label(problem, disparity_graph)
        })?;

        let disparity_graph = graph.disparity_graph();
        for pixel in disparity_graph.pixels() {
            let count = graph.available_disparities(pixel).count();
            if count != 1 {
                return Err(LabelingError::AmbiguousLabel { pixel, count });
            }
        }

        Ok(())
    }

    fn statistics(&self) -> BackendStatistics {
        self.statistics
    }
}

const NUM_BUFFERS: usize = 7;

/// The buffers of a constraint graph uploaded to a device, with the scalar arguments shared by
/// the kernels.
#[derive(Debug)]
struct DeviceProblem {
    availability: BufferHandle,
    changed: BufferHandle,
    left: BufferHandle,
    right: BufferHandle,
    min_pixels: BufferHandle,
    min_edges: BufferHandle,
    reparametrization: BufferHandle,
    scalars: [KernelArgument; 7],
    num_nodes: usize,
}

impl DeviceProblem {
    fn upload<D: ComputeDevice>(
        device: &mut D,
        graph: &ConstraintGraph<'_>,
    ) -> Result<DeviceProblem, DeviceError> {
        let disparity_graph = graph.disparity_graph();
        let lowest_penalties = graph.lowest_penalties();

        let availability = graph
            .availability_buffer()
            .into_iter()
            .map(i32::from)
            .collect();

        let scalars = [
            KernelArgument::Ulong(disparity_graph.height() as u64),
            KernelArgument::Ulong(disparity_graph.width() as u64),
            KernelArgument::Ulong(u64::from(disparity_graph.left().max_value())),
            KernelArgument::Ulong(disparity_graph.disparity_levels() as u64),
            KernelArgument::Double(graph.threshold()),
            KernelArgument::Double(disparity_graph.cleanness()),
            KernelArgument::Double(disparity_graph.smoothness()),
        ];

        let contents = [
            BufferData::Int(availability),
            BufferData::Int(vec![0]),
            intensities(disparity_graph.left()),
            intensities(disparity_graph.right()),
            BufferData::Double(lowest_penalties.pixels_buffer()),
            BufferData::Double(lowest_penalties.neighborhoods_buffer()),
            BufferData::Double(disparity_graph.reparametrization_buffer()),
        ];
        let mut handles = [BufferHandle(0); NUM_BUFFERS];
        for (index, data) in contents.into_iter().enumerate() {
            match device.create_buffer(data) {
                Ok(handle) => handles[index] = handle,
                Err(error) => {
                    // Whatever the release reports, the creation failure is the one to surface.
                    let _ = release_buffers(device, &handles[..index]);
                    return Err(error);
                }
            }
        }
        let [availability, changed, left, right, min_pixels, min_edges, reparametrization] =
            handles;

        Ok(DeviceProblem {
            availability,
            changed,
            left,
            right,
            min_pixels,
            min_edges,
            reparametrization,
            scalars,
            num_nodes: disparity_graph.indexing().num_nodes(),
        })
    }

    fn buffers(&self) -> [BufferHandle; NUM_BUFFERS] {
        [
            self.availability,
            self.changed,
            self.left,
            self.right,
            self.min_pixels,
            self.min_edges,
            self.reparametrization,
        ]
    }

    fn problem_arguments(&self) -> impl Iterator<Item = KernelArgument> + '_ {
        [
            self.left,
            self.right,
            self.min_pixels,
            self.min_edges,
            self.reparametrization,
        ]
        .into_iter()
        .map(KernelArgument::Buffer)
        .chain(self.scalars)
    }

    fn csp_iteration_arguments(&self) -> Vec<KernelArgument> {
        [
            KernelArgument::Buffer(self.availability),
            KernelArgument::Buffer(self.changed),
        ]
        .into_iter()
        .chain(self.problem_arguments())
        .collect()
    }

    fn choose_best_node_arguments(&self, pixel: Pixel) -> Vec<KernelArgument> {
        std::iter::once(KernelArgument::Buffer(self.availability))
            .chain(self.problem_arguments())
            .chain([
                KernelArgument::Ulong(pixel.x as u64),
                KernelArgument::Ulong(pixel.y as u64),
            ])
            .collect()
    }

    fn release<D: ComputeDevice>(self, device: &mut D) -> Result<(), DeviceError> {
        release_buffers(device, &self.buffers())
    }
}

/// Release every buffer in `handles`, even after a failed release. The first failure is returned.
fn release_buffers<D: ComputeDevice>(
    device: &mut D,
    handles: &[BufferHandle],
) -> Result<(), DeviceError> {
    handles
        .iter()
        .map(|&handle| device.release_buffer(handle))
        .fold(Ok(()), Result::and)
}

fn intensities(image: &Image) -> BufferData {
    disparity_assert_simple!(
        i32::try_from(image.max_value()).is_ok(),
        "intensities do not fit into an int buffer"
    );
    BufferData::Int(image.data().iter().map(|&value| value as i32).collect())
}

fn read_int_buffer<D: ComputeDevice>(
    device: &D,
    handle: BufferHandle,
) -> Result<Vec<i32>, DeviceError> {
    match device.read_buffer(handle)? {
        BufferData::Int(values) => Ok(values),
        other => Err(DeviceError::BufferType {
            handle: handle.0,
            expected: "int",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::HostDevice;
    use crate::backends::Sequential;
    use crate::basic_types::Node;
    use crate::engine::LowestPenalties;

    fn graph() -> DisparityGraph {
        let left = Image::new(4, 3, 10, vec![4, 5, 10, 1, 0, 3, 0, 9, 2, 2, 7, 0])
            .expect("valid image");
        let right = Image::new(4, 3, 10, vec![10, 7, 0, 1, 3, 0, 9, 0, 2, 7, 0, 0])
            .expect("valid image");
        DisparityGraph::new(left, right, 3, 1.0, 1.0).expect("valid graph")
    }

    #[test]
    fn reaches_the_sequential_fixed_point() {
        let graph = graph();
        let penalties = LowestPenalties::new(&graph);

        for threshold in [0.0, 1.0, 4.0, 9.0, 25.0, 100.0] {
            let mut sequential_graph = ConstraintGraph::new(&graph, &penalties, threshold);
            let mut kernel_graph = ConstraintGraph::new(&graph, &penalties, threshold);

            let sequential = Sequential::new()
                .solve_csp(&mut sequential_graph)
                .expect("no device");
            let mut backend = KernelDispatch::new(HostDevice::new());
            let kernel = backend
                .solve_csp(&mut kernel_graph)
                .expect("device runs the kernels");

            assert_eq!(sequential, kernel);
            assert_eq!(
                sequential_graph.availability_buffer(),
                kernel_graph.availability_buffer()
            );
            assert_eq!(0, backend.device().num_live_buffers());
        }
    }

    #[test]
    fn labeling_matches_the_sequential_labeling() {
        let graph = graph();
        let penalties = LowestPenalties::new(&graph);

        let mut sequential_graph = ConstraintGraph::new(&graph, &penalties, 100.0);
        let mut sequential = Sequential::new();
        assert!(sequential.solve_csp(&mut sequential_graph).expect("no device"));
        sequential
            .find_labeling(&mut sequential_graph)
            .expect("consistent graph can be labeled");

        let mut kernel_graph = ConstraintGraph::new(&graph, &penalties, 100.0);
        let mut backend = KernelDispatch::new(HostDevice::new());
        assert!(backend.solve_csp(&mut kernel_graph).expect("device runs"));
        backend
            .find_labeling(&mut kernel_graph)
            .expect("consistent graph can be labeled");

        assert_eq!(
            sequential_graph.available_nodes().collect::<Vec<Node>>(),
            kernel_graph.available_nodes().collect::<Vec<Node>>()
        );
        assert_eq!(12, kernel_graph.count_available_nodes());
        assert_eq!(0, backend.device().num_live_buffers());
    }

    #[test]
    fn statistics_count_removed_nodes() {
        let black = Image::new(3, 2, 1, vec![0; 6]).expect("valid image");
        let graph = DisparityGraph::new(black.clone(), black, 2, 1.0, 1.0).expect("valid graph");
        let penalties = LowestPenalties::new(&graph);
        let mut constraint_graph = ConstraintGraph::new(&graph, &penalties, 0.0);
        let mut backend = KernelDispatch::new(HostDevice::new());

        assert!(backend.solve_csp(&mut constraint_graph).expect("device runs"));

        let statistics = backend.statistics();
        assert_eq!(1, statistics.csp_solves);
        assert_eq!(4, statistics.removed_nodes);
        assert_eq!(6, constraint_graph.count_available_nodes());
    }

    #[test]
    fn device_errors_are_reported() {
        #[derive(Debug, Default)]
        struct BrokenDevice(HostDevice);

        impl ComputeDevice for BrokenDevice {
            fn name(&self) -> &str {
                "broken"
            }

            fn create_buffer(&mut self, data: BufferData) -> Result<BufferHandle, DeviceError> {
                self.0.create_buffer(data)
            }

            fn write_buffer(
                &mut self,
                handle: BufferHandle,
                data: BufferData,
            ) -> Result<(), DeviceError> {
                self.0.write_buffer(handle, data)
            }

            fn read_buffer(&self, handle: BufferHandle) -> Result<BufferData, DeviceError> {
                self.0.read_buffer(handle)
            }

            fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), DeviceError> {
                self.0.release_buffer(handle)
            }

            fn run_kernel(
                &mut self,
                name: &str,
                _arguments: &[KernelArgument],
                _work_size: WorkSize,
            ) -> Result<(), DeviceError> {
                Err(DeviceError::UnknownKernel(name.to_owned()))
            }
        }

        let graph = graph();
        let penalties = LowestPenalties::new(&graph);
        let mut constraint_graph = ConstraintGraph::new(&graph, &penalties, 4.0);
        let mut backend = KernelDispatch::new(BrokenDevice::default());

        let result = backend.solve_csp(&mut constraint_graph);

        assert!(matches!(
            result,
            Err(LabelingError::Device(DeviceError::UnknownKernel(kernel))) if kernel == CSP_ITERATION
        ));
        assert_eq!(0, backend.device().0.num_live_buffers());
    }

    #[test]
    fn failed_upload_releases_the_created_buffers() {
        /// Creates `capacity` buffers and refuses every buffer after that.
        #[derive(Debug)]
        struct LimitedDevice {
            device: HostDevice,
            capacity: usize,
        }

        impl ComputeDevice for LimitedDevice {
            fn name(&self) -> &str {
                "limited"
            }

            fn create_buffer(&mut self, data: BufferData) -> Result<BufferHandle, DeviceError> {
                if self.device.num_live_buffers() == self.capacity {
                    return Err(DeviceError::UnknownBuffer(self.capacity));
                }
                self.device.create_buffer(data)
            }

            fn write_buffer(
                &mut self,
                handle: BufferHandle,
                data: BufferData,
            ) -> Result<(), DeviceError> {
                self.device.write_buffer(handle, data)
            }

            fn read_buffer(&self, handle: BufferHandle) -> Result<BufferData, DeviceError> {
                self.device.read_buffer(handle)
            }

            fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), DeviceError> {
                self.device.release_buffer(handle)
            }

            fn run_kernel(
                &mut self,
                name: &str,
                arguments: &[KernelArgument],
                work_size: WorkSize,
            ) -> Result<(), DeviceError> {
                self.device.run_kernel(name, arguments, work_size)
            }
        }

        let graph = graph();
        let penalties = LowestPenalties::new(&graph);
        let mut constraint_graph = ConstraintGraph::new(&graph, &penalties, 4.0);
        let available_before = constraint_graph.availability_buffer();
        let mut backend = KernelDispatch::new(LimitedDevice {
            device: HostDevice::new(),
            capacity: 3,
        });

        let result = backend.solve_csp(&mut constraint_graph);

        assert!(matches!(
            result,
            Err(LabelingError::Device(DeviceError::UnknownBuffer(3)))
        ));
        assert_eq!(0, backend.device().device.num_live_buffers());
        assert_eq!(available_before, constraint_graph.availability_buffer());

        // Once buffers are available again, the same backend can solve the graph.
        backend.device.capacity = NUM_BUFFERS;
        assert!(backend.solve_csp(&mut constraint_graph).is_ok());
        assert_eq!(0, backend.device().device.num_live_buffers());
    }
}
