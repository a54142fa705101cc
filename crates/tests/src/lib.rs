//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 示例配置加载
//! - 模拟 e2e 测试（无需 CARLA）：mock 传感器 → ingestion → 渲染循环 → 渲染器
//! - sink 并发读写压力测试

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use contracts::{ColormapKind, RendererType, SensorType};
    use std::path::PathBuf;

    fn sample_config() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/lidar_radar.toml")
    }

    #[test]
    fn test_sample_config_loads() {
        let blueprint = ConfigLoader::load_from_path(&sample_config()).unwrap();

        assert_eq!(blueprint.vehicle.blueprint, "vehicle.lincoln.mkz_2020");
        assert_eq!(blueprint.vehicle.spawn_point_index, 10);

        let lidar = blueprint.sensor("lidar").unwrap();
        assert_eq!(lidar.sensor_type, SensorType::Lidar);
        assert_eq!(lidar.effective_colormap(), ColormapKind::Plasma);

        let radar = blueprint.sensor("radar").unwrap();
        assert_eq!(radar.effective_colormap(), ColormapKind::Winter);

        assert!(blueprint.viewer.chase_camera);
        assert_eq!(blueprint.viewer.chase_offset.x, -4.0);
        assert_eq!(blueprint.viewer.chase_offset.z, 2.5);
        assert_eq!(blueprint.viewer.tick_interval_ms, 5);
        assert!(blueprint
            .renderers
            .iter()
            .any(|r| r.renderer_type == RendererType::Log));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use actor_factory::{ActorFactory, CarlaClient, MockCarlaClient, MockSensor, MockSensorConfig};
    use contracts::{
        ContractError, FrameRenderer, LidarPoint, PointCloudData, SceneSnapshot, SensorConfig,
        SensorDataCallback, SensorPacket, SensorPayload, SensorSource, SensorType,
        ViewerBlueprint, ViewerConfig,
    };
    use ingestion::IngestionPipeline;
    use viewer::{RenderLoop, RenderLoopConfig, RendererHandle};

    /// Renderer that records what it was shown
    struct CountingRenderer {
        rendered: Arc<AtomicU64>,
        max_points: Arc<Mutex<Vec<(String, usize)>>>,
        misaligned: Arc<AtomicU64>,
    }

    impl FrameRenderer for CountingRenderer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError> {
            self.rendered.fetch_add(1, Ordering::SeqCst);
            let mut max_points = self.max_points.lock().unwrap();
            for cloud in &snapshot.clouds {
                if cloud.positions().len() != cloud.colors().len() {
                    self.misaligned.fetch_add(1, Ordering::SeqCst);
                }
                if cloud
                    .colors()
                    .iter()
                    .flatten()
                    .any(|c| !(0.0..=1.0).contains(c))
                {
                    self.misaligned.fetch_add(1, Ordering::SeqCst);
                }
                let id = cloud.sensor_id().to_string();
                match max_points.iter_mut().find(|(sensor, _)| *sensor == id) {
                    Some((_, max)) => *max = (*max).max(cloud.len()),
                    None => max_points.push((id, cloud.len())),
                }
            }
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    struct Counters {
        rendered: Arc<AtomicU64>,
        max_points: Arc<Mutex<Vec<(String, usize)>>>,
        misaligned: Arc<AtomicU64>,
    }

    fn counting_renderer() -> (CountingRenderer, Counters) {
        let counters = Counters {
            rendered: Arc::new(AtomicU64::new(0)),
            max_points: Arc::new(Mutex::new(Vec::new())),
            misaligned: Arc::new(AtomicU64::new(0)),
        };
        let renderer = CountingRenderer {
            rendered: Arc::clone(&counters.rendered),
            max_points: Arc::clone(&counters.max_points),
            misaligned: Arc::clone(&counters.misaligned),
        };
        (renderer, counters)
    }

    fn fast_mock(points_per_frame: u32) -> MockSensorConfig {
        MockSensorConfig {
            frequency_hz: 200.0,
            points_per_frame,
            ..Default::default()
        }
    }

    /// End-to-end test: MockSensor -> IngestionPipeline -> RenderLoop -> renderer
    ///
    /// 验证完整的数据流：
    /// 1. mock LiDAR / Radar 在各自线程产生数据包
    /// 2. 回调线程内完成转换并写入单槽通道
    /// 3. 渲染循环拉取最新帧并分发快照
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let lidar = SensorConfig::with_defaults("lidar", SensorType::Lidar);
        let radar = SensorConfig::with_defaults("radar", SensorType::Radar);

        let mut ingestion = IngestionPipeline::new();
        ingestion
            .register_sensor_source(
                &lidar,
                Box::new(MockSensor::new("lidar".into(), SensorType::Lidar, fast_mock(2000))),
            )
            .unwrap();
        ingestion
            .register_sensor_source(
                &radar,
                Box::new(MockSensor::new("radar".into(), SensorType::Radar, fast_mock(200))),
            )
            .unwrap();
        let subscribers = ingestion.take_subscribers().unwrap();

        let (renderer, counters) = counting_renderer();
        let render_loop = RenderLoop::new(
            subscribers,
            vec![RendererHandle::spawn(renderer, 1024)],
            RenderLoopConfig {
                tick_interval: Duration::from_millis(2),
                max_ticks: Some(100),
            },
        );

        ingestion.start_all();
        let report = render_loop.run(std::future::pending()).await;
        ingestion.stop_all();

        assert_eq!(report.ticks, 100);
        assert!(report.frames_pulled > 0, "no frame reached the sinks");
        assert_eq!(counters.rendered.load(Ordering::SeqCst), 100);
        assert_eq!(counters.misaligned.load(Ordering::SeqCst), 0);

        let max_points = counters.max_points.lock().unwrap().clone();
        let lidar_points = max_points.iter().find(|(id, _)| id == "lidar").map(|(_, n)| *n);
        assert!(lidar_points.is_some_and(|n| n > 0 && n <= 2000));
        assert!(max_points.contains(&("radar".to_string(), 200)));

        let metrics = ingestion.metrics().snapshot();
        assert!(metrics.frames_converted > 0);
        assert_eq!(metrics.frames_rejected, 0);
    }

    /// Full session against the mock CARLA client
    #[tokio::test]
    async fn test_e2e_mock_session_spawn_view_teardown() {
        let blueprint = ViewerBlueprint::lidar_radar_default();

        let mut client = MockCarlaClient::new();
        client.connect("localhost", 2000).await.unwrap();
        let factory = ActorFactory::new(client);

        let graph = factory.spawn_session(&blueprint).await.unwrap();
        assert_eq!(factory.client().actor_count(), 3);

        let sources = factory.sensor_sources(&graph, &blueprint).unwrap();
        let mut ingestion = IngestionPipeline::new();
        for (sensor, source) in blueprint.sensors.iter().zip(sources) {
            ingestion.register_sensor_source(sensor, source).unwrap();
        }

        let (renderer, counters) = counting_renderer();
        let render_loop = RenderLoop::new(
            ingestion.take_subscribers().unwrap(),
            vec![RendererHandle::spawn(renderer, 1024)],
            RenderLoopConfig {
                tick_interval: Duration::from_millis(5),
                max_ticks: Some(40),
            },
        );

        ingestion.start_all();
        let report = render_loop.run(std::future::pending()).await;
        ingestion.stop_all();
        factory.teardown(&graph).await.unwrap();

        assert_eq!(report.ticks, 40);
        assert_eq!(counters.rendered.load(Ordering::SeqCst), 40);
        assert_eq!(factory.client().actor_count(), 0);
    }

    /// One-shot LiDAR source delivering a fixed frame
    struct OneShotLidar {
        points: Vec<LidarPoint>,
    }

    impl SensorSource for OneShotLidar {
        fn sensor_id(&self) -> &str {
            "lidar"
        }

        fn sensor_type(&self) -> SensorType {
            SensorType::Lidar
        }

        fn listen(&self, callback: SensorDataCallback) {
            callback(SensorPacket {
                sensor_id: "lidar".into(),
                sensor_type: SensorType::Lidar,
                timestamp: 0.5,
                frame_id: Some(1),
                payload: SensorPayload::PointCloud(PointCloudData::from_points(&self.points)),
            });
        }

        fn stop(&self) {}

        fn is_listening(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_single_lidar_point_reaches_sink_mirrored_and_colored() {
        let config = SensorConfig::with_defaults("lidar", SensorType::Lidar);
        let source = OneShotLidar {
            points: vec![LidarPoint {
                x: 1.0,
                y: 2.0,
                z: 3.0,
                intensity: 1.0,
            }],
        };

        let mut ingestion = IngestionPipeline::new();
        ingestion
            .register_sensor_source(&config, Box::new(source))
            .unwrap();
        let subscribers = ingestion.take_subscribers().unwrap();
        let mut render_loop = RenderLoop::new(subscribers, Vec::new(), RenderLoopConfig::default());

        ingestion.start_all();
        assert_eq!(render_loop.update(), 1);

        let frame = render_loop.sink("lidar").unwrap().snapshot();
        assert_eq!(frame.positions(), &[[-1.0, 2.0, 3.0]]);

        let expected = converter::colormap(config.effective_colormap()).sample(1.0);
        assert_eq!(frame.colors(), &[expected]);
    }

    #[test]
    fn test_viewer_defaults_match_session_defaults() {
        let viewer = ViewerConfig::default();
        assert_eq!(viewer.window_name, "Carla Lidar");
        assert_eq!((viewer.width, viewer.height), (960, 540));
        assert_eq!((viewer.left, viewer.top), (480, 270));
    }
}

#[cfg(test)]
mod stress_tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;

    use contracts::{ColoredPoint, PointCloudFrame, SensorType};
    use ingestion::frame_slot;
    use viewer::PointCloudSink;

    /// Frame whose every position and color encodes its own id
    fn tagged_frame(frame_id: u64) -> PointCloudFrame {
        let n = 1 + (frame_id % 97) as usize;
        let tag = frame_id as f32;
        PointCloudFrame::from_points(
            "lidar".into(),
            SensorType::Lidar,
            frame_id as f64,
            Some(frame_id),
            (0..n).map(|_| ColoredPoint {
                position: [tag, tag, tag],
                color: [tag, 0.0, 0.0],
            }),
        )
    }

    /// 并发写入与读取：读者永远不会看到来自两帧的混合数据
    #[test]
    fn test_concurrent_sink_never_tears() {
        const FRAMES: u64 = 20_000;

        let sink = Arc::new(PointCloudSink::new("lidar", SensorType::Lidar));
        let done = Arc::new(AtomicBool::new(false));
        let torn = Arc::new(AtomicU64::new(0));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let sink = Arc::clone(&sink);
                let done = Arc::clone(&done);
                let torn = Arc::clone(&torn);
                thread::spawn(move || {
                    let mut reads = 0u64;
                    while !done.load(Ordering::Acquire) {
                        let frame = sink.snapshot();
                        reads += 1;
                        if frame.positions().len() != frame.colors().len() {
                            torn.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                        let Some(frame_id) = frame.frame_id() else {
                            continue;
                        };
                        let tag = frame_id as f32;
                        let consistent = frame
                            .points()
                            .all(|p| p.position == [tag, tag, tag] && p.color[0] == tag);
                        if !consistent || frame.len() != 1 + (frame_id % 97) as usize {
                            torn.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    reads
                })
            })
            .collect();

        let writer = {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                for frame_id in 1..=FRAMES {
                    sink.replace(Arc::new(tagged_frame(frame_id)));
                }
            })
        };

        writer.join().unwrap();
        done.store(true, Ordering::Release);
        let total_reads: u64 = readers.into_iter().map(|r| r.join().unwrap()).sum();

        assert!(total_reads > 0);
        assert_eq!(torn.load(Ordering::Relaxed), 0);
        assert_eq!(sink.version(), FRAMES);
        assert_eq!(sink.snapshot().frame_id(), Some(FRAMES));
    }

    /// 单槽通道：消费者看到的帧号严格递增，最终拿到最后一帧
    #[test]
    fn test_slot_overwrite_keeps_latest() {
        const FRAMES: u64 = 5_000;

        let (publisher, mut subscriber) = frame_slot("lidar", SensorType::Lidar);
        let writer = thread::spawn(move || {
            for frame_id in 1..=FRAMES {
                publisher.publish(tagged_frame(frame_id));
            }
            publisher
        });

        let mut last_seen = 0u64;
        while !writer.is_finished() {
            if let Some(frame) = subscriber.take_latest() {
                let frame_id = frame.frame_id().unwrap();
                assert!(frame_id > last_seen, "{} after {}", frame_id, last_seen);
                last_seen = frame_id;
            }
        }
        let _publisher = writer.join().unwrap();

        if let Some(frame) = subscriber.take_latest() {
            last_seen = frame.frame_id().unwrap();
        }
        assert_eq!(last_seen, FRAMES);
        assert!(subscriber.take_latest().is_none());
    }
}
