//! Staging-upload round trip on a real headless device. Requires a GPU, so
//! it only runs with `--features integration-tests` like the other
//! device-backed tests.

#[test]
#[cfg(feature = "integration-tests")]
fn uploaded_bytes_survive_the_staging_copy() {
    use overflight::cleanup::{self, ResourceQueue};
    use overflight::upload::UploadPipeline;
    use std::time::Duration;

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (device, queue) = runtime.block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no suitable GPU adapter found");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("GPU device creation failed")
    });

    let pipeline = UploadPipeline::new(device.clone(), queue.clone());
    let mut cleanup = ResourceQueue::new();

    // 7 bytes forces the staging buffer to pad to COPY_BUFFER_ALIGNMENT; the
    // destination must still carry exactly the original contents.
    let payload: Vec<u8> = vec![0xAB, 0x01, 0x02, 0x03, 0x04, 0x05, 0xFF];
    let buffer = pipeline
        .upload_buffer(
            &payload,
            wgpu::BufferUsages::COPY_SRC,
            "round trip source",
            &mut cleanup,
        )
        .unwrap();

    let readback_size = buffer.size();
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("round trip readback"),
        size: readback_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("round trip encoder"),
    });
    encoder.copy_buffer_to_buffer(&buffer, 0, &readback, 0, readback_size);
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    readback
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(10)),
        })
        .unwrap();
    runtime
        .block_on(rx.receive())
        .unwrap()
        .expect("readback mapping failed");

    {
        let data = readback.slice(..).get_mapped_range();
        assert_eq!(&data[..payload.len()], payload.as_slice());
        // Padding introduced by the staging copy is zeroed, not garbage.
        assert!(data[payload.len()..].iter().all(|&b| b == 0));
    }
    readback.unmap();

    // Resources entered the deletion queue in creation order; releasing them
    // must not panic after the GPU has gone idle.
    cleanup.flush(cleanup::release);
}
