//! 单槽覆盖通道
//!
//! 每个传感器一个 `tokio::sync::watch` 槽：生产者 (传感器回调线程) 只覆盖最新帧，
//! 消费者 (渲染循环) 每个 tick 取走自上次以来的最新帧。未读帧被新帧替换即丢弃。
//!
//! `pending` 只在持有 watch 锁时修改 (发布端在 `send_modify` 内，消费端持有 `Ref` 时)，
//! 所以每一帧恰好被读取或被覆盖一次，`overwritten` 是精确计数。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{PointCloudFrame, SensorId, SensorType};
use tokio::sync::watch;

/// 槽内共享状态
#[derive(Debug, Default)]
struct SlotState {
    /// 是否有未被消费的帧
    pending: AtomicBool,
    /// 被覆盖 (未读即被替换) 的帧数；整个会话唯一的覆盖计数
    overwritten: AtomicU64,
}

/// 创建一个传感器的单槽通道，初始内容为空帧
pub fn frame_slot(
    sensor_id: impl Into<SensorId>,
    sensor_type: SensorType,
) -> (FramePublisher, FrameSubscriber) {
    let sensor_id = sensor_id.into();
    let initial = Arc::new(PointCloudFrame::empty(sensor_id.clone(), sensor_type));
    let (tx, rx) = watch::channel(initial);
    let state = Arc::new(SlotState::default());

    (
        FramePublisher {
            sensor_id: sensor_id.clone(),
            sensor_type,
            tx,
            state: state.clone(),
        },
        FrameSubscriber {
            sensor_id,
            sensor_type,
            rx,
            state,
        },
    )
}

/// 生产端：只能写入自己传感器的槽
#[derive(Debug)]
pub struct FramePublisher {
    sensor_id: SensorId,
    sensor_type: SensorType,
    tx: watch::Sender<Arc<PointCloudFrame>>,
    state: Arc<SlotState>,
}

impl FramePublisher {
    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// 发布一帧，替换尚未读取的旧帧
    ///
    /// 返回 `true` 表示覆盖了一个未读帧。
    pub fn publish(&self, frame: PointCloudFrame) -> bool {
        let frame = Arc::new(frame);
        let mut overwrote = false;
        self.tx.send_modify(|slot| {
            *slot = frame;
            overwrote = self.state.pending.swap(true, Ordering::AcqRel);
        });
        if overwrote {
            self.state.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        overwrote
    }

    /// 消费端是否已关闭
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// 消费端：渲染循环每个 tick 调用一次
#[derive(Debug)]
pub struct FrameSubscriber {
    sensor_id: SensorId,
    sensor_type: SensorType,
    rx: watch::Receiver<Arc<PointCloudFrame>>,
    state: Arc<SlotState>,
}

impl FrameSubscriber {
    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// 取出自上次调用以来的最新帧 (没有新帧时返回 None)
    ///
    /// 发送端 drop 之后，最后一个未读帧仍可取出一次。
    pub fn take_latest(&mut self) -> Option<Arc<PointCloudFrame>> {
        let latest = self.rx.borrow_and_update();
        if !latest.has_changed() {
            return None;
        }
        self.state.pending.store(false, Ordering::Release);
        Some(Arc::clone(&latest))
    }

    /// 当前槽内的帧 (不标记为已读)
    pub fn current(&self) -> Arc<PointCloudFrame> {
        self.rx.borrow().clone()
    }

    /// 等待下一帧；发送端关闭后返回 None
    pub async fn next_frame(&mut self) -> Option<Arc<PointCloudFrame>> {
        self.rx.changed().await.ok()?;
        let latest = self.rx.borrow_and_update();
        self.state.pending.store(false, Ordering::Release);
        Some(Arc::clone(&latest))
    }

    /// 被覆盖的未读帧数
    pub fn overwritten(&self) -> u64 {
        self.state.overwritten.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ColoredPoint;

    fn frame(n: usize, frame_id: u64) -> PointCloudFrame {
        PointCloudFrame::from_points(
            "lidar".into(),
            SensorType::Lidar,
            frame_id as f64,
            Some(frame_id),
            vec![ColoredPoint::default(); n],
        )
    }

    #[test]
    fn starts_empty_without_pending_frame() {
        let (_tx, mut rx) = frame_slot("lidar", SensorType::Lidar);
        assert!(rx.take_latest().is_none());
        assert!(rx.current().is_empty());
    }

    #[test]
    fn latest_frame_wins() {
        let (tx, mut rx) = frame_slot("lidar", SensorType::Lidar);

        assert!(!tx.publish(frame(1, 1)));
        assert!(tx.publish(frame(2, 2)));
        assert!(tx.publish(frame(3, 3)));

        let latest = rx.take_latest().unwrap();
        assert_eq!(latest.frame_id(), Some(3));
        assert_eq!(latest.len(), 3);
        assert_eq!(rx.overwritten(), 2);

        // consumed
        assert!(rx.take_latest().is_none());
        assert!(!tx.publish(frame(4, 4)));
        assert_eq!(rx.take_latest().unwrap().frame_id(), Some(4));
    }

    #[test]
    fn publisher_drop_is_not_a_new_frame() {
        let (tx, mut rx) = frame_slot("radar", SensorType::Radar);
        tx.publish(frame(1, 1));
        assert!(rx.take_latest().is_some());
        drop(tx);
        assert!(rx.take_latest().is_none());
    }

    #[test]
    fn unread_frame_survives_publisher_drop() {
        let (tx, mut rx) = frame_slot("lidar", SensorType::Lidar);
        tx.publish(frame(7, 9));
        drop(tx);
        assert_eq!(rx.take_latest().unwrap().frame_id(), Some(9));
        assert!(rx.take_latest().is_none());
    }

    #[test]
    fn every_frame_is_either_read_or_overwritten() {
        const FRAMES: u64 = 20_000;
        let (tx, mut rx) = frame_slot("lidar", SensorType::Lidar);

        let writer = std::thread::spawn(move || {
            let mut overwrites = 0;
            for id in 1..=FRAMES {
                if tx.publish(frame(1, id)) {
                    overwrites += 1;
                }
            }
            overwrites
        });

        let mut read = 0u64;
        let mut last_id = 0;
        while !writer.is_finished() {
            if let Some(latest) = rx.take_latest() {
                let id = latest.frame_id().unwrap();
                assert!(id > last_id);
                last_id = id;
                read += 1;
            }
        }
        let overwrites = writer.join().unwrap();
        if rx.take_latest().is_some() {
            read += 1;
        }

        assert_eq!(rx.overwritten(), overwrites);
        assert_eq!(read + rx.overwritten(), FRAMES);
    }

    #[tokio::test]
    async fn next_frame_waits_for_publish() {
        let (tx, mut rx) = frame_slot("lidar", SensorType::Lidar);

        let handle = tokio::spawn(async move { rx.next_frame().await.map(|f| f.len()) });
        tokio::task::yield_now().await;
        tx.publish(frame(5, 1));

        assert_eq!(handle.await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn next_frame_ends_when_publisher_dropped() {
        let (tx, mut rx) = frame_slot("lidar", SensorType::Lidar);
        drop(tx);
        assert!(rx.next_frame().await.is_none());
    }

    #[test]
    fn subscriber_drop_closes_publisher() {
        let (tx, rx) = frame_slot("lidar", SensorType::Lidar);
        assert!(!tx.is_closed());
        drop(rx);
        assert!(tx.is_closed());
    }
}
