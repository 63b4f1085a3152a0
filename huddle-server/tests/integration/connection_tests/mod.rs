mod test_two_peers_join_room;
